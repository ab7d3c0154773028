//! Storage whose every operation fails

use async_trait::async_trait;
use bytes::Bytes;
use sieve_core::StorageBackend;
use sieve_storage::{ObjectMeta, Storage, StorageError, StorageResult, StoredObject};

/// Simulates an unreachable object store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStorage;

fn unavailable() -> StorageError {
    StorageError::BackendError("storage unavailable".to_string())
}

#[async_trait]
impl Storage for FailingStorage {
    async fn write(&self, _: &str, _: &str, _: Bytes, _: &str) -> StorageResult<String> {
        Err(StorageError::UploadFailed("storage unavailable".to_string()))
    }

    async fn read(&self, _: &str, _: &str) -> StorageResult<StoredObject> {
        Err(unavailable())
    }

    async fn copy(&self, _: &str, _: &str, _: &str) -> StorageResult<String> {
        Err(StorageError::CopyFailed("storage unavailable".to_string()))
    }

    async fn delete(&self, _: &str, _: &str) -> StorageResult<()> {
        Err(StorageError::DeleteFailed("storage unavailable".to_string()))
    }

    async fn exists(&self, _: &str, _: &str) -> StorageResult<bool> {
        Err(unavailable())
    }

    async fn list(&self, _: &str) -> StorageResult<Vec<ObjectMeta>> {
        Err(unavailable())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
