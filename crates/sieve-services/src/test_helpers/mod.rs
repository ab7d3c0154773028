//! Test helpers for pipeline unit and integration tests
//!
//! Fakes for the collaborator traits plus small fixtures, so the stages can
//! be exercised without a real object store or classification service.

pub mod failing_storage;
pub mod recording_classifier;

pub use failing_storage::FailingStorage;
pub use recording_classifier::RecordingClassifier;

use sieve_core::{Finding, JobHandle, JobResult, JobStatus, Likelihood, ScanJobSpec};

/// A finished job over `target_url` with the given findings.
pub fn done_job(handle: &str, target_url: &str, findings: Vec<Finding>) -> JobResult {
    JobResult {
        handle: JobHandle::new(handle),
        status: JobStatus::Done,
        spec: ScanJobSpec {
            target_url: target_url.to_string(),
            info_types: vec!["EMAIL_ADDRESS".to_string()],
            min_likelihood: Likelihood::Possible,
            max_findings: 0,
            notification_topic: "projects/test/topics/classification".to_string(),
        },
        findings,
    }
}

pub fn finding(info_type: &str, count: u64) -> Finding {
    Finding {
        info_type: info_type.to_string(),
        count,
    }
}
