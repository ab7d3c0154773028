use crate::keys;
use crate::traits::{ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

type Buckets = HashMap<String, BTreeMap<String, MemoryObject>>;

/// In-process object store. Buckets are created on first write.
///
/// Clones share the same underlying buckets.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    buckets: Arc<RwLock<Buckets>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently held in `bucket`.
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        keys::validate(bucket, name)?;
        let size = data.len();

        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(
                name.to_string(),
                MemoryObject {
                    data,
                    content_type: content_type.to_string(),
                    last_modified: Utc::now(),
                },
            );

        tracing::debug!(
            bucket = %bucket,
            key = %name,
            size_bytes = size,
            "Memory storage write successful"
        );

        Ok(self.url(bucket, name))
    }

    async fn read(&self, bucket: &str, name: &str) -> StorageResult<StoredObject> {
        keys::validate(bucket, name)?;

        let buckets = self.buckets.read().await;
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, name)))?;

        Ok(StoredObject {
            data: object.data.clone(),
            content_type: object.content_type.clone(),
        })
    }

    async fn copy(&self, bucket: &str, name: &str, dest_bucket: &str) -> StorageResult<String> {
        keys::validate(bucket, name)?;
        keys::validate_bucket(dest_bucket)?;

        let mut buckets = self.buckets.write().await;
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, name)))?;

        buckets.entry(dest_bucket.to_string()).or_default().insert(
            name.to_string(),
            MemoryObject {
                last_modified: Utc::now(),
                ..object
            },
        );

        tracing::debug!(
            from_bucket = %bucket,
            to_bucket = %dest_bucket,
            key = %name,
            "Memory storage copy successful"
        );

        Ok(name.to_string())
    }

    async fn delete(&self, bucket: &str, name: &str) -> StorageResult<()> {
        keys::validate(bucket, name)?;

        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            objects.remove(name);
        }

        Ok(())
    }

    async fn exists(&self, bucket: &str, name: &str) -> StorageResult<bool> {
        keys::validate(bucket, name)?;
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.contains_key(name))
            .unwrap_or(false))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<ObjectMeta>> {
        keys::validate_bucket(bucket)?;
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(name, object)| ObjectMeta {
                        name: name.clone(),
                        size: object.data.len() as u64,
                        content_type: Some(object.content_type.clone()),
                        last_modified: object.last_modified,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
