//! Topic listener: subscription loop plus a bounded worker pool.
//!
//! Shutdown: [`TopicListener::shutdown`] stops pulling new messages and waits
//! for in-flight handlers to finish.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::handler::MessageHandler;
use crate::pubsub::{Message, MessageStream, PubSub, PubSubError};

#[derive(Clone, Debug)]
pub struct ListenerConfig {
    /// Maximum number of messages handled concurrently.
    pub max_concurrent: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

pub struct TopicListener {
    topic: String,
    shutdown_tx: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl TopicListener {
    /// Subscribe to `topic` and start dispatching to `handler`.
    ///
    /// The subscription is established before this returns, so anything
    /// published afterwards is delivered.
    pub async fn start(
        pubsub: Arc<dyn PubSub>,
        topic: &str,
        handler: Arc<dyn MessageHandler>,
        config: ListenerConfig,
    ) -> Result<Self, PubSubError> {
        let stream = pubsub.subscribe(topic).await?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let topic_clone = topic.to_string();
        let worker = tokio::spawn(async move {
            Self::worker_pool(topic_clone, stream, handler, config, shutdown_rx).await;
        });

        tracing::info!(topic = %topic, "Topic listener started");

        Ok(Self {
            topic: topic.to_string(),
            shutdown_tx,
            worker,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop the listener and wait for in-flight messages.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, topic = %self.topic, "Topic listener task panicked");
        }
    }

    async fn worker_pool(
        topic: String,
        mut stream: MessageStream,
        handler: Arc<dyn MessageHandler>,
        config: ListenerConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let max_concurrent = config.max_concurrent.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        tracing::info!(
            topic = %topic,
            handler = handler.name(),
            max_concurrent = max_concurrent,
            "Listener worker pool started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!(topic = %topic, "Listener worker pool shutting down");
                    break;
                }
                next = stream.next() => {
                    let Some(message) = next else {
                        tracing::info!(topic = %topic, "Subscription closed");
                        break;
                    };
                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let handler = handler.clone();
                    let topic = topic.clone();

                    tokio::spawn(async move {
                        let _permit = permit;
                        Self::process_message(&topic, handler.as_ref(), message).await;
                    });
                }
            }
        }

        // Wait for in-flight handlers by taking every permit back.
        let _ = semaphore.acquire_many(max_concurrent as u32).await;
        tracing::info!(topic = %topic, "Listener worker pool stopped");
    }

    #[tracing::instrument(
        skip_all,
        fields(
            topic = %topic,
            handler = handler.name(),
            message_id = %message.id,
            message.status = tracing::field::Empty,
        )
    )]
    async fn process_message(topic: &str, handler: &dyn MessageHandler, message: Message) {
        let start = std::time::Instant::now();
        match handler.handle(message).await {
            Ok(()) => {
                tracing::Span::current().record("message.status", "handled");
                tracing::debug!(
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Message handled"
                );
            }
            Err(e) => {
                tracing::Span::current().record("message.status", "failed");
                tracing::error!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Message handler failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::InMemoryPubSub;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        seen: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn handle(&self, message: Message) -> anyhow::Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if Some(message.data.as_ref()) == self.fail_on.map(str::as_bytes) {
                anyhow::bail!("refusing {}", message.id);
            }
            Ok(())
        }
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_listener_dispatches_and_survives_handler_errors() {
        let pubsub: Arc<dyn PubSub> = Arc::new(InMemoryPubSub::default());
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_on: Some("bad"),
        });

        let listener = TopicListener::start(
            pubsub.clone(),
            "events",
            handler.clone(),
            ListenerConfig { max_concurrent: 2 },
        )
        .await
        .unwrap();
        assert_eq!(listener.topic(), "events");

        for payload in ["one", "bad", "three"] {
            pubsub.publish("events", Message::new(payload)).await.unwrap();
        }

        wait_for(&handler.seen, 3).await;
        listener.shutdown().await;
        assert_eq!(handler.seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shutdown_stops_delivery() {
        let pubsub: Arc<dyn PubSub> = Arc::new(InMemoryPubSub::default());
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_on: None,
        });

        let listener = TopicListener::start(
            pubsub.clone(),
            "events",
            handler.clone(),
            ListenerConfig::default(),
        )
        .await
        .unwrap();
        listener.shutdown().await;

        pubsub.publish("events", Message::new("late")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handler.seen.load(Ordering::SeqCst), 0);
    }
}
