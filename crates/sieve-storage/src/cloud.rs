use crate::keys;
use crate::traits::{ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Cloud object storage (S3 or Google Cloud Storage) via `object_store`.
///
/// `object_store` clients are bound to a single bucket, so one client is
/// built per configured bucket. Addressing a bucket that was not configured
/// is a `ConfigError`.
#[derive(Clone)]
pub struct CloudStorage {
    backend: StorageBackend,
    stores: HashMap<String, Arc<dyn ObjectStore>>,
}

impl CloudStorage {
    /// Create S3-backed storage for `buckets`.
    ///
    /// # Arguments
    /// * `buckets` - Every bucket the pipeline touches
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new_s3(
        buckets: &[&str],
        region: &str,
        endpoint_url: Option<&str>,
    ) -> StorageResult<Self> {
        let mut stores: HashMap<String, Arc<dyn ObjectStore>> = HashMap::new();
        for bucket in buckets {
            keys::validate_bucket(bucket)?;
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region)
                .with_bucket_name(*bucket);

            if let Some(endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            stores.insert(bucket.to_string(), Arc::new(store));
        }

        Ok(CloudStorage {
            backend: StorageBackend::S3,
            stores,
        })
    }

    /// Create Google Cloud Storage-backed storage for `buckets`. Credentials
    /// come from the environment unless a service account file is given.
    pub fn new_gcs(buckets: &[&str], service_account_path: Option<&str>) -> StorageResult<Self> {
        let mut stores: HashMap<String, Arc<dyn ObjectStore>> = HashMap::new();
        for bucket in buckets {
            keys::validate_bucket(bucket)?;
            let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(*bucket);
            if let Some(path) = service_account_path {
                builder = builder.with_service_account_path(path);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            stores.insert(bucket.to_string(), Arc::new(store));
        }

        Ok(CloudStorage {
            backend: StorageBackend::Gcs,
            stores,
        })
    }

    /// Wrap pre-built stores. Used with `object_store::memory::InMemory` in tests.
    pub fn from_stores(
        backend: StorageBackend,
        stores: HashMap<String, Arc<dyn ObjectStore>>,
    ) -> Self {
        CloudStorage { backend, stores }
    }

    fn store(&self, bucket: &str) -> StorageResult<&Arc<dyn ObjectStore>> {
        self.stores.get(bucket).ok_or_else(|| {
            StorageError::ConfigError(format!("Bucket {} is not configured", bucket))
        })
    }

    fn content_type_of(attributes: &Attributes) -> Option<String> {
        attributes
            .get(&Attribute::ContentType)
            .map(|value| AsRef::<str>::as_ref(value).to_string())
    }

    fn put_options(content_type: &str) -> PutOptions {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        PutOptions {
            attributes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Storage for CloudStorage {
    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: bytes::Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        keys::validate(bucket, name)?;
        let store = self.store(bucket)?;
        let size = data.len() as u64;
        let location = Path::from(name);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(
                &location,
                PutPayload::from(data),
                Self::put_options(content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %bucket,
                key = %name,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloud storage write failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            bucket = %bucket,
            key = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloud storage write successful"
        );

        Ok(self.url(bucket, name))
    }

    async fn read(&self, bucket: &str, name: &str) -> StorageResult<StoredObject> {
        keys::validate(bucket, name)?;
        let store = self.store(bucket)?;
        let location = Path::from(name);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                StorageError::NotFound(format!("{}/{}", bucket, name))
            }
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloud storage read failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let content_type = Self::content_type_of(&result.attributes)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %bucket,
            key = %name,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloud storage read successful"
        );

        Ok(StoredObject { data, content_type })
    }

    async fn copy(&self, bucket: &str, name: &str, dest_bucket: &str) -> StorageResult<String> {
        keys::validate(bucket, name)?;
        keys::validate_bucket(dest_bucket)?;
        let start = std::time::Instant::now();

        // Buckets are separate clients, so the copy goes through this process.
        let object = self.read(bucket, name).await?;
        let dest = self.store(dest_bucket)?;

        let result: ObjectResult<_> = dest
            .put_opts(
                &Path::from(name),
                PutPayload::from(object.data),
                Self::put_options(&object.content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                from_bucket = %bucket,
                to_bucket = %dest_bucket,
                key = %name,
                "Cloud storage copy failed"
            );
            StorageError::CopyFailed(e.to_string())
        })?;

        tracing::info!(
            from_bucket = %bucket,
            to_bucket = %dest_bucket,
            key = %name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloud storage copy successful"
        );

        Ok(name.to_string())
    }

    async fn delete(&self, bucket: &str, name: &str) -> StorageResult<()> {
        keys::validate(bucket, name)?;
        let store = self.store(bucket)?;
        let location = Path::from(name);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloud storage delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloud storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, name: &str) -> StorageResult<bool> {
        keys::validate(bucket, name)?;
        let store = self.store(bucket)?;
        match store.head(&Path::from(name)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<ObjectMeta>> {
        keys::validate_bucket(bucket)?;
        let store = self.store(bucket)?;

        let listed: Vec<object_store::ObjectMeta> = store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let mut objects: Vec<ObjectMeta> = listed
            .into_iter()
            .map(|meta| ObjectMeta {
                name: meta.location.to_string(),
                size: meta.size as u64,
                content_type: None,
                last_modified: meta.last_modified,
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(all(test, feature = "storage-cloud"))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::memory::InMemory;

    fn storage() -> CloudStorage {
        let mut stores: HashMap<String, Arc<dyn ObjectStore>> = HashMap::new();
        for bucket in ["staging", "sensitive"] {
            stores.insert(bucket.to_string(), Arc::new(InMemory::new()));
        }
        CloudStorage::from_stores(StorageBackend::Gcs, stores)
    }

    #[tokio::test]
    async fn test_write_read_keeps_content_type() {
        let storage = storage();
        let url = storage
            .write("staging", "report.csv", Bytes::from_static(b"a,b"), "text/csv")
            .await
            .unwrap();
        assert_eq!(url, "gs://staging/report.csv");

        let object = storage.read("staging", "report.csv").await.unwrap();
        assert_eq!(object.data, Bytes::from_static(b"a,b"));
        assert_eq!(object.content_type, "text/csv");
    }

    #[tokio::test]
    async fn test_copy_across_buckets() {
        let storage = storage();
        storage
            .write("staging", "a.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        storage.copy("staging", "a.txt", "sensitive").await.unwrap();

        let copied = storage.read("sensitive", "a.txt").await.unwrap();
        assert_eq!(copied.content_type, "text/plain");
        assert!(storage.exists("staging", "a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_missing_is_not_found() {
        let storage = storage();
        let result = storage.copy("staging", "ghost.txt", "sensitive").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_bucket_rejected() {
        let storage = storage();
        let result = storage
            .write("elsewhere", "a.txt", Bytes::new(), "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let storage = storage();
        storage
            .write("staging", "x/1.txt", Bytes::from_static(b"1"), "text/plain")
            .await
            .unwrap();
        let listed = storage.list("staging").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "x/1.txt");
        assert_eq!(listed[0].size, 1);

        storage.delete("staging", "x/1.txt").await.unwrap();
        storage.delete("staging", "x/1.txt").await.unwrap();
        assert!(!storage.exists("staging", "x/1.txt").await.unwrap());
    }
}
