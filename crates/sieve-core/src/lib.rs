//! Sieve Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared by every sieve component: the intake endpoint, the scan dispatcher
//! and the result router.

pub mod classifier_types;
pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use classifier_types::ClassifierBackend;
pub use config::{BaseConfig, Config, PipelineConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    CompletionNotification, Finding, IntakeReceipt, JobHandle, JobResult, JobStatus, Likelihood,
    ObjectCreated, RoutingDecision, ScanJobSpec, Submission, JOB_NAME_ATTRIBUTE,
};
pub use storage_types::StorageBackend;
