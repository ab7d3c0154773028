//! Publish/subscribe collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

/// Default per-topic buffer for the in-memory transport.
pub const DEFAULT_TOPIC_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Message encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A message with an opaque payload and string attributes.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub data: Bytes,
    pub attributes: HashMap<String, String>,
    pub publish_time: DateTime<Utc>,
}

impl Message {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            data: data.into(),
            attributes: HashMap::new(),
            publish_time: Utc::now(),
        }
    }

    /// Message whose payload is `value` encoded as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, PubSubError> {
        Ok(Self::new(serde_json::to_vec(value)?))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, PubSubError> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// Stream of messages delivered to one subscriber.
pub type MessageStream = BoxStream<'static, Message>;

#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publish to `topic` and return the message id.
    async fn publish(&self, topic: &str, message: Message) -> Result<String, PubSubError>;

    /// Subscribe to `topic`. Only messages published after this call are delivered.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream, PubSubError>;
}

/// In-process transport backed by one `tokio::sync::broadcast` channel per topic.
///
/// Every subscriber receives every message. Publishing to a topic with no
/// subscribers drops the message, like a topic without subscriptions.
#[derive(Clone)]
pub struct InMemoryPubSub {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Message>>>>,
    capacity: usize,
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

impl InMemoryPubSub {
    pub fn new(capacity: usize) -> Self {
        InMemoryPubSub {
            topics: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<Message> {
        self.topics
            .lock()
            .await
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    fn validate_topic(topic: &str) -> Result<(), PubSubError> {
        if topic.trim().is_empty() {
            return Err(PubSubError::InvalidTopic("topic cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PubSub for InMemoryPubSub {
    async fn publish(&self, topic: &str, message: Message) -> Result<String, PubSubError> {
        Self::validate_topic(topic)?;
        let id = message.id.clone();

        match self.sender(topic).await.send(message) {
            Ok(receivers) => {
                tracing::debug!(
                    topic = %topic,
                    message_id = %id,
                    receivers = receivers,
                    "Message published"
                );
            }
            Err(_) => {
                tracing::debug!(
                    topic = %topic,
                    message_id = %id,
                    "No subscribers on topic, message dropped"
                );
            }
        }

        Ok(id)
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream, PubSubError> {
        Self::validate_topic(topic)?;
        let receiver = self.sender(topic).await.subscribe();
        let topic = topic.to_string();

        let stream = stream::unfold(receiver, move |mut receiver| {
            let topic = topic.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(message) => return Some((message, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                topic = %topic,
                                skipped = skipped,
                                "Subscriber lagged, messages skipped"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let pubsub = InMemoryPubSub::default();
        let mut a = pubsub.subscribe("projects/p/topics/t").await.unwrap();
        let mut b = pubsub.subscribe("projects/p/topics/t").await.unwrap();

        let message = Message::json(&Ping { n: 7 })
            .unwrap()
            .with_attribute("DlpJobName", "projects/p/dlpJobs/i-1");
        let id = pubsub.publish("projects/p/topics/t", message).await.unwrap();

        let got_a = a.next().await.unwrap();
        let got_b = b.next().await.unwrap();
        assert_eq!(got_a.id, id);
        assert_eq!(got_b.id, id);
        assert_eq!(got_a.decode_json::<Ping>().unwrap(), Ping { n: 7 });
        assert_eq!(
            got_b.attributes.get("DlpJobName").map(String::as_str),
            Some("projects/p/dlpJobs/i-1")
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let pubsub = InMemoryPubSub::default();
        let result = pubsub.publish("nobody-listens", Message::new("x")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let pubsub = InMemoryPubSub::default();
        let mut other = pubsub.subscribe("other").await.unwrap();
        pubsub.publish("main", Message::new("x")).await.unwrap();
        pubsub.publish("other", Message::new("y")).await.unwrap();

        let got = other.next().await.unwrap();
        assert_eq!(got.data, Bytes::from_static(b"y"));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let pubsub = InMemoryPubSub::default();
        assert!(matches!(
            pubsub.publish(" ", Message::new("x")).await,
            Err(PubSubError::InvalidTopic(_))
        ));
    }
}
