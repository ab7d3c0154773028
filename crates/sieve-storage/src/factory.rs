#[cfg(feature = "storage-cloud")]
use crate::CloudStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{InMemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
use sieve_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let buckets = [
        config.staging_bucket(),
        config.sensitive_bucket(),
        config.nonsensitive_bucket(),
    ];

    match config.storage_backend() {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; objects are lost on restart");
            Ok(Arc::new(InMemoryStorage::new()))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = LocalStorage::new(config.local_storage_path()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-cloud")]
        StorageBackend::S3 => {
            let region = config.s3_region().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let storage = CloudStorage::new_s3(&buckets, region, config.s3_endpoint())?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-cloud")]
        StorageBackend::Gcs => {
            let storage = CloudStorage::new_gcs(&buckets, config.gcs_service_account_path())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-cloud"))]
        StorageBackend::S3 | StorageBackend::Gcs => {
            let _ = buckets;
            Err(StorageError::ConfigError(
                "Cloud storage backends not available (storage-cloud feature not enabled)"
                    .to_string(),
            ))
        }
    }
}
