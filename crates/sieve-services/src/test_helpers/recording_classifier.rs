//! Classification service fake that records submissions

use async_trait::async_trait;
use sieve_core::{JobHandle, JobResult, ScanJobSpec};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::classification::ClassificationService;
use crate::error::ClassificationError;

/// Records every submitted spec and serves fetches from preloaded results.
///
/// Submitted jobs get handles `{parent}/dlpJobs/i-{n}`. Nothing is published;
/// tests drive the router directly.
#[derive(Default)]
pub struct RecordingClassifier {
    submissions: Mutex<Vec<(String, ScanJobSpec)>>,
    results: Mutex<HashMap<JobHandle, JobResult>>,
    fail_submit: bool,
    fail_fetch: bool,
}

impl RecordingClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A classifier whose submit and fetch calls always fail.
    pub fn failing() -> Self {
        Self {
            fail_submit: true,
            fail_fetch: true,
            ..Self::default()
        }
    }

    pub fn with_result(self, result: JobResult) -> Self {
        self.insert_result(result);
        self
    }

    pub fn insert_result(&self, result: JobResult) {
        self.results
            .lock()
            .unwrap()
            .insert(result.handle.clone(), result);
    }

    /// `(parent, spec)` pairs in submission order.
    pub fn submissions(&self) -> Vec<(String, ScanJobSpec)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassificationService for RecordingClassifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn submit_job(
        &self,
        parent: &str,
        spec: &ScanJobSpec,
    ) -> Result<JobHandle, ClassificationError> {
        if self.fail_submit {
            return Err(ClassificationError::SubmitFailed(
                "classification service unavailable".to_string(),
            ));
        }
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push((parent.to_string(), spec.clone()));
        Ok(JobHandle::new(format!(
            "{}/dlpJobs/i-{}",
            parent,
            submissions.len()
        )))
    }

    async fn fetch_job(&self, job: &JobHandle) -> Result<JobResult, ClassificationError> {
        if self.fail_fetch {
            return Err(ClassificationError::FetchFailed(
                "classification service unavailable".to_string(),
            ));
        }
        self.results
            .lock()
            .unwrap()
            .get(job)
            .cloned()
            .ok_or_else(|| ClassificationError::JobNotFound(job.to_string()))
    }
}
