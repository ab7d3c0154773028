//! Classification collaborator
//!
//! A classification service accepts a [`ScanJobSpec`], runs the inspection
//! asynchronously and publishes a completion notification carrying the job
//! handle. Results are fetched afterwards by handle.

#[cfg(feature = "classifier-local")]
pub mod detectors;
#[cfg(feature = "classifier-dlp")]
pub mod dlp;
#[cfg(feature = "classifier-local")]
pub mod local;

use async_trait::async_trait;
use sieve_core::{ClassifierBackend, Config, JobHandle, JobResult, ScanJobSpec};
use sieve_storage::Storage;
use sieve_worker::PubSub;
use std::sync::Arc;

use crate::error::ClassificationError;

#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Submit a job under `parent` (`projects/{id}`) and return its handle.
    async fn submit_job(
        &self,
        parent: &str,
        spec: &ScanJobSpec,
    ) -> Result<JobHandle, ClassificationError>;

    /// Fetch the current state of a job.
    async fn fetch_job(&self, job: &JobHandle) -> Result<JobResult, ClassificationError>;
}

/// Create the classification backend selected by configuration.
///
/// The local classifier reads targets from `storage` and publishes
/// completions on `pubsub`. The DLP client needs neither.
pub fn create_classifier(
    config: &Config,
    storage: Arc<dyn Storage>,
    pubsub: Arc<dyn PubSub>,
) -> Result<Arc<dyn ClassificationService>, ClassificationError> {
    match config.classifier_backend() {
        #[cfg(feature = "classifier-local")]
        ClassifierBackend::Local => {
            tracing::info!("Using local regex classifier");
            Ok(Arc::new(local::LocalClassifier::new(storage, pubsub)?))
        }

        #[cfg(not(feature = "classifier-local"))]
        ClassifierBackend::Local => {
            let _ = (storage, pubsub);
            Err(ClassificationError::ConfigError(
                "Local classifier not available (classifier-local feature not enabled)"
                    .to_string(),
            ))
        }

        #[cfg(feature = "classifier-dlp")]
        ClassifierBackend::Dlp => {
            let _ = (storage, pubsub);
            let token = config.dlp_access_token().ok_or_else(|| {
                ClassificationError::ConfigError("DLP_ACCESS_TOKEN not configured".to_string())
            })?;
            tracing::info!(endpoint = %config.dlp_endpoint(), "Using DLP classification service");
            Ok(Arc::new(dlp::DlpClient::new(
                config.dlp_endpoint(),
                token,
                std::time::Duration::from_secs(config.dlp_timeout_secs()),
            )?))
        }

        #[cfg(not(feature = "classifier-dlp"))]
        ClassifierBackend::Dlp => {
            let _ = (storage, pubsub);
            Err(ClassificationError::ConfigError(
                "DLP classifier not available (classifier-dlp feature not enabled)".to_string(),
            ))
        }
    }
}
