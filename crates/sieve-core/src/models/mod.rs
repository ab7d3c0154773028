//! Domain models for the classification pipeline.

pub mod events;
pub mod int64;
pub mod scan;
pub mod submission;

pub use events::{CompletionNotification, ObjectCreated, JOB_NAME_ATTRIBUTE};
pub use scan::{
    Finding, JobHandle, JobResult, JobStatus, Likelihood, ObjectUrl, RoutingDecision, ScanJobSpec,
};
pub use submission::{IntakeReceipt, Submission};
