use crate::keys;
use crate::traits::{ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const OBJECTS_DIR: &str = "objects";
const META_DIR: &str = "meta";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Sidecar record kept next to each object.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectSidecar {
    content_type: String,
    written_at: DateTime<Utc>,
}

/// Local filesystem storage implementation
///
/// Layout: `{base_path}/{bucket}/objects/{name}` holds the bytes and
/// `{base_path}/{bucket}/meta/{name}.json` the content type.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`
    /// (e.g., "/var/lib/sieve/storage").
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Resolve the object and sidecar paths for an address.
    fn object_paths(&self, bucket: &str, name: &str) -> StorageResult<(PathBuf, PathBuf)> {
        keys::validate_path(bucket, name)?;
        let bucket_dir = self.base_path.join(bucket);
        let object = bucket_dir.join(OBJECTS_DIR).join(name);
        let meta = bucket_dir.join(META_DIR).join(format!("{}.json", name));
        Ok((object, meta))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    async fn read_sidecar(&self, meta_path: &Path) -> Option<ObjectSidecar> {
        let raw = fs::read(meta_path).await.ok()?;
        serde_json::from_slice(&raw).ok()
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let (path, meta_path) = self.object_paths(bucket, name)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.write_file(&path, &data).await?;

        let sidecar = ObjectSidecar {
            content_type: content_type.to_string(),
            written_at: Utc::now(),
        };
        let sidecar_json = serde_json::to_vec(&sidecar)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode sidecar: {}", e)))?;
        self.write_file(&meta_path, &sidecar_json).await?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(self.url(bucket, name))
    }

    async fn read(&self, bucket: &str, name: &str) -> StorageResult<StoredObject> {
        let (path, meta_path) = self.object_paths(bucket, name)?;
        let start = std::time::Instant::now();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, name)));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let content_type = self
            .read_sidecar(&meta_path)
            .await
            .map(|s| s.content_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        tracing::debug!(
            path = %path.display(),
            bucket = %bucket,
            key = %name,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(StoredObject {
            data: Bytes::from(data),
            content_type,
        })
    }

    async fn copy(&self, bucket: &str, name: &str, dest_bucket: &str) -> StorageResult<String> {
        let (from_path, from_meta) = self.object_paths(bucket, name)?;
        let (to_path, to_meta) = self.object_paths(dest_bucket, name)?;

        if !tokio::fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, name)));
        }

        self.ensure_parent_dir(&to_path).await?;
        fs::copy(&from_path, &to_path).await.map_err(|e| {
            StorageError::CopyFailed(format!(
                "Failed to copy {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        if tokio::fs::try_exists(&from_meta).await.unwrap_or(false) {
            self.ensure_parent_dir(&to_meta).await?;
            fs::copy(&from_meta, &to_meta).await.map_err(|e| {
                StorageError::CopyFailed(format!(
                    "Failed to copy sidecar {}: {}",
                    from_meta.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            from_bucket = %bucket,
            to_bucket = %dest_bucket,
            key = %name,
            from_path = %from_path.display(),
            to_path = %to_path.display(),
            "Local storage copy successful"
        );

        Ok(name.to_string())
    }

    async fn delete(&self, bucket: &str, name: &str) -> StorageResult<()> {
        let (path, meta_path) = self.object_paths(bucket, name)?;
        let start = std::time::Instant::now();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        if tokio::fs::try_exists(&meta_path).await.unwrap_or(false) {
            if let Err(e) = fs::remove_file(&meta_path).await {
                tracing::warn!(
                    error = %e,
                    path = %meta_path.display(),
                    "Failed to remove sidecar"
                );
            }
        }

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, name: &str) -> StorageResult<bool> {
        let (path, _) = self.object_paths(bucket, name)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<ObjectMeta>> {
        keys::validate_bucket(bucket)?;
        let root = self.base_path.join(bucket).join(OBJECTS_DIR);
        let meta_root = self.base_path.join(bucket).join(META_DIR);

        if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");

                let metadata = entry.metadata().await?;
                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                let content_type = self
                    .read_sidecar(&meta_root.join(format!("{}.json", name)))
                    .await
                    .map(|s| s.content_type);

                objects.push(ObjectMeta {
                    name,
                    size: metadata.len(),
                    content_type,
                    last_modified,
                });
            }
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_write_read() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = Bytes::from_static(b"name,email\nAda,ada@example.com\n");
        let url = storage
            .write("staging", "report.csv", data.clone(), "text/csv")
            .await
            .unwrap();
        assert_eq!(url, "file://staging/report.csv");

        let object = storage.read("staging", "report.csv").await.unwrap();
        assert_eq!(object.data, data);
        assert_eq!(object.content_type, "text/csv");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.read("staging", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("staging", "../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("staging", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.copy("staging", "a.txt", "../outside").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.delete("staging", "nonexistent/file.txt").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_copy_between_buckets() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = Bytes::from_static(b"original content");
        storage
            .write("staging", "nested/original.txt", data.clone(), "text/plain")
            .await
            .unwrap();

        let name = storage
            .copy("staging", "nested/original.txt", "sensitive")
            .await
            .unwrap();
        assert_eq!(name, "nested/original.txt");

        let copied = storage.read("sensitive", "nested/original.txt").await.unwrap();
        assert_eq!(copied.data, data);
        assert_eq!(copied.content_type, "text/plain");
        assert!(storage.exists("staging", "nested/original.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_copy_missing_source() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.copy("staging", "gone.txt", "sensitive").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_storage_list() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .write("staging", "b/two.txt", Bytes::from_static(b"22"), "text/plain")
            .await
            .unwrap();
        storage
            .write("staging", "one.txt", Bytes::from_static(b"1"), "text/plain")
            .await
            .unwrap();

        let listed = storage.list("staging").await.unwrap();
        let names: Vec<&str> = listed.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b/two.txt", "one.txt"]);
        assert_eq!(listed[0].size, 2);
        assert_eq!(listed[0].content_type.as_deref(), Some("text/plain"));

        assert!(storage.list("never-written").await.unwrap().is_empty());
    }
}
