//! Intake stage: persist submitted files into the staging bucket.

use sieve_core::{AppError, IntakeReceipt, Submission};
use sieve_storage::Storage;
use std::sync::Arc;
use std::time::Instant;

/// Writes submissions verbatim into the staging bucket.
///
/// Intake never starts a scan itself. The staging write raises an
/// object-created event (see [`crate::EventingStorage`]) and the dispatcher
/// reacts to that.
#[derive(Clone)]
pub struct IntakeService {
    storage: Arc<dyn Storage>,
    staging_bucket: String,
}

impl IntakeService {
    pub fn new(storage: Arc<dyn Storage>, staging_bucket: impl Into<String>) -> Self {
        Self {
            storage,
            staging_bucket: staging_bucket.into(),
        }
    }

    pub fn staging_bucket(&self) -> &str {
        &self.staging_bucket
    }

    /// Store `submission` under its own name.
    ///
    /// `None` or a submission without a file name is `MissingPayload` and
    /// nothing is written. Storage failures propagate; there is no retry.
    #[tracing::instrument(skip_all, fields(bucket = %self.staging_bucket))]
    pub async fn submit(&self, submission: Option<Submission>) -> Result<IntakeReceipt, AppError> {
        let submission = match submission {
            Some(s) if !s.name.trim().is_empty() => s,
            _ => {
                tracing::debug!("Upload rejected: no file in request");
                return Err(AppError::MissingPayload);
            }
        };

        let start = Instant::now();
        let size = submission.size();
        let url = self
            .storage
            .write(
                &self.staging_bucket,
                &submission.name,
                submission.data,
                &submission.content_type,
            )
            .await?;

        tracing::info!(
            object = %submission.name,
            content_type = %submission.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File staged"
        );

        Ok(IntakeReceipt {
            bucket: self.staging_bucket.clone(),
            name: submission.name,
            size,
            content_type: submission.content_type,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailingStorage;
    use sieve_storage::InMemoryStorage;

    #[tokio::test]
    async fn test_submit_stores_bytes_and_content_type() {
        let storage = Arc::new(InMemoryStorage::new());
        let intake = IntakeService::new(storage.clone(), "quarantine");

        let receipt = intake
            .submit(Some(Submission::new(
                "report.csv",
                Some("text/csv".to_string()),
                &b"a,b\n1,2\n"[..],
            )))
            .await
            .unwrap();

        assert_eq!(receipt.bucket, "quarantine");
        assert_eq!(receipt.name, "report.csv");
        assert_eq!(receipt.size, 8);
        assert_eq!(receipt.url, "mem://quarantine/report.csv");

        let stored = storage.read("quarantine", "report.csv").await.unwrap();
        assert_eq!(stored.data.as_ref(), b"a,b\n1,2\n");
        assert_eq!(stored.content_type, "text/csv");
    }

    #[tokio::test]
    async fn test_missing_payload_writes_nothing() {
        let storage = Arc::new(InMemoryStorage::new());
        let intake = IntakeService::new(storage.clone(), "quarantine");

        let err = intake.submit(None).await.unwrap_err();
        assert!(matches!(err, AppError::MissingPayload));

        let err = intake
            .submit(Some(Submission::new("  ", None, &b"data"[..])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingPayload));

        assert_eq!(storage.object_count("quarantine").await, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let intake = IntakeService::new(Arc::new(FailingStorage), "quarantine");

        let err = intake
            .submit(Some(Submission::new("notes.txt", None, &b"hi"[..])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn test_submit_keeps_unusual_names_verbatim() {
        let storage = Arc::new(InMemoryStorage::new());
        let intake = IntakeService::new(storage.clone(), "quarantine");

        let receipt = intake
            .submit(Some(Submission::new("a//b.csv", None, &b"x,y"[..])))
            .await
            .unwrap();
        assert_eq!(receipt.name, "a//b.csv");

        let stored = storage.read("quarantine", "a//b.csv").await.unwrap();
        assert_eq!(stored.data.as_ref(), b"x,y");
        assert_eq!(storage.object_count("quarantine").await, 1);
    }
}
