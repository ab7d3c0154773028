//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sieve_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(object) => AppError::ObjectNotFound(object),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::StorageFailure(other.to_string()),
        }
    }
}

/// Object bytes together with the content type recorded at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Listing entry for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// Storage abstraction trait
///
/// All storage backends (memory, local filesystem, cloud) implement this trait
/// so the pipeline never couples to one of them.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `bucket/name`, replacing any existing object.
    /// Returns the object URL.
    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Read an object and its content type.
    async fn read(&self, bucket: &str, name: &str) -> StorageResult<StoredObject>;

    /// Copy `bucket/name` into `dest_bucket` under the same name and return the
    /// name. Fails with `NotFound` when the source does not exist.
    async fn copy(&self, bucket: &str, name: &str, dest_bucket: &str) -> StorageResult<String>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, bucket: &str, name: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, bucket: &str, name: &str) -> StorageResult<bool>;

    /// List every object in a bucket.
    async fn list(&self, bucket: &str) -> StorageResult<Vec<ObjectMeta>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Object URL, `{scheme}://{bucket}/{name}`.
    fn url(&self, bucket: &str, name: &str) -> String {
        format!("{}://{}/{}", self.backend_type().url_scheme(), bucket, name)
    }
}
