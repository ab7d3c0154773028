//! Object-created events for storage backends that cannot emit them.
//!
//! Cloud buckets notify subscribers natively. The memory and local backends
//! do not, so `EventingStorage` wraps any backend and publishes an
//! [`ObjectCreated`] message after each successful write or copy.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sieve_core::{ObjectCreated, StorageBackend};
use sieve_storage::{ObjectMeta, Storage, StorageResult, StoredObject};
use sieve_worker::{Message, PubSub};
use std::sync::Arc;

pub struct EventingStorage {
    inner: Arc<dyn Storage>,
    pubsub: Arc<dyn PubSub>,
    topic: String,
}

impl EventingStorage {
    pub fn new(inner: Arc<dyn Storage>, pubsub: Arc<dyn PubSub>, topic: impl Into<String>) -> Self {
        Self {
            inner,
            pubsub,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish failures are logged; the storage operation already succeeded.
    async fn emit(&self, event: ObjectCreated) {
        let message = match Message::json(&event) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, object = %event.name, "Failed to encode object event");
                return;
            }
        };

        match self.pubsub.publish(&self.topic, message).await {
            Ok(message_id) => {
                tracing::debug!(
                    bucket = %event.bucket,
                    object = %event.name,
                    message_id = %message_id,
                    "Object-created event published"
                );
            }
            Err(e) => {
                tracing::error!(
                    bucket = %event.bucket,
                    object = %event.name,
                    topic = %self.topic,
                    error = %e,
                    "Failed to publish object-created event"
                );
            }
        }
    }
}

#[async_trait]
impl Storage for EventingStorage {
    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let size = data.len() as u64;
        let url = self.inner.write(bucket, name, data, content_type).await?;

        let mut event = ObjectCreated::new(bucket, name);
        event.content_type = Some(content_type.to_string());
        event.size = Some(size);
        event.time_created = Some(Utc::now());
        self.emit(event).await;

        Ok(url)
    }

    async fn read(&self, bucket: &str, name: &str) -> StorageResult<StoredObject> {
        self.inner.read(bucket, name).await
    }

    async fn copy(&self, bucket: &str, name: &str, dest_bucket: &str) -> StorageResult<String> {
        let copied = self.inner.copy(bucket, name, dest_bucket).await?;

        let mut event = ObjectCreated::new(dest_bucket, &copied);
        event.time_created = Some(Utc::now());
        self.emit(event).await;

        Ok(copied)
    }

    async fn delete(&self, bucket: &str, name: &str) -> StorageResult<()> {
        self.inner.delete(bucket, name).await
    }

    async fn exists(&self, bucket: &str, name: &str) -> StorageResult<bool> {
        self.inner.exists(bucket, name).await
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<ObjectMeta>> {
        self.inner.list(bucket).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    fn url(&self, bucket: &str, name: &str) -> String {
        self.inner.url(bucket, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailingStorage;
    use futures::StreamExt;
    use sieve_storage::InMemoryStorage;
    use sieve_worker::InMemoryPubSub;

    const TOPIC: &str = "projects/tidal/topics/object-created";

    #[tokio::test]
    async fn test_write_emits_created_event() {
        let pubsub = Arc::new(InMemoryPubSub::default());
        let mut events = pubsub.subscribe(TOPIC).await.unwrap();
        let storage = EventingStorage::new(Arc::new(InMemoryStorage::new()), pubsub, TOPIC);

        storage
            .write("quarantine", "report.csv", Bytes::from_static(b"a,b"), "text/csv")
            .await
            .unwrap();

        let event: ObjectCreated = events.next().await.unwrap().decode_json().unwrap();
        assert_eq!(event.bucket, "quarantine");
        assert_eq!(event.name, "report.csv");
        assert_eq!(event.content_type.as_deref(), Some("text/csv"));
        assert_eq!(event.size, Some(3));
    }

    #[tokio::test]
    async fn test_copy_emits_event_for_destination() {
        let pubsub = Arc::new(InMemoryPubSub::default());
        let storage = EventingStorage::new(Arc::new(InMemoryStorage::new()), pubsub.clone(), TOPIC);
        storage
            .write("quarantine", "notes.txt", Bytes::from_static(b"hi"), "text/plain")
            .await
            .unwrap();

        let mut events = pubsub.subscribe(TOPIC).await.unwrap();
        storage
            .copy("quarantine", "notes.txt", "non-sensitive")
            .await
            .unwrap();

        let event: ObjectCreated = events.next().await.unwrap().decode_json().unwrap();
        assert_eq!(event.bucket, "non-sensitive");
        assert_eq!(event.name, "notes.txt");
    }

    #[tokio::test]
    async fn test_failed_write_emits_nothing() {
        let pubsub = Arc::new(InMemoryPubSub::default());
        let mut events = pubsub.subscribe(TOPIC).await.unwrap();
        let storage = EventingStorage::new(Arc::new(FailingStorage), pubsub.clone(), TOPIC);

        assert!(storage
            .write("quarantine", "a.txt", Bytes::from_static(b"x"), "text/plain")
            .await
            .is_err());

        pubsub.publish(TOPIC, Message::new("marker")).await.unwrap();
        let next = events.next().await.unwrap();
        assert_eq!(next.data, Bytes::from_static(b"marker"));
    }
}
