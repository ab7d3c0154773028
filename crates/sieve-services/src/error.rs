use sieve_core::{AppError, ErrorMetadata, LogLevel};
use thiserror::Error;

/// Classification collaborator errors
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Job submission failed: {0}")]
    SubmitFailed(String),

    #[error("Job fetch failed: {0}")]
    FetchFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Unexpected classification service response: {0}")]
    InvalidResponse(String),

    #[error("Classifier configuration error: {0}")]
    ConfigError(String),
}

impl From<ClassificationError> for AppError {
    fn from(err: ClassificationError) -> Self {
        match err {
            ClassificationError::SubmitFailed(_) => AppError::JobSubmissionFailure(err.to_string()),
            ClassificationError::FetchFailed(_)
            | ClassificationError::JobNotFound(_)
            | ClassificationError::InvalidResponse(_) => AppError::JobFetchFailure(err.to_string()),
            ClassificationError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Log a swallowed stage error at the level its metadata asks for.
pub(crate) fn log_swallowed(error: &AppError, stage: &'static str) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, stage, "Stage failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, stage, "Stage failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type, stage, "Stage failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_errors_map_to_submission_failure() {
        let err: AppError = ClassificationError::SubmitFailed("503".to_string()).into();
        assert!(matches!(err, AppError::JobSubmissionFailure(_)));
    }

    #[test]
    fn test_fetch_side_errors_map_to_fetch_failure() {
        for err in [
            ClassificationError::FetchFailed("timeout".to_string()),
            ClassificationError::JobNotFound("projects/p/dlpJobs/i-1".to_string()),
            ClassificationError::InvalidResponse("missing fileSet.url".to_string()),
        ] {
            let app: AppError = err.into();
            assert!(matches!(app, AppError::JobFetchFailure(_)));
        }
    }
}
