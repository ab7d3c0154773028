//! Message handler trait
//!
//! Pipeline entry points implement this trait. A [`TopicListener`](crate::TopicListener)
//! calls `handle` once per delivered message; errors are logged by the
//! listener and never stop the subscription.

use anyhow::Result;
use async_trait::async_trait;

use crate::pubsub::Message;

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Process one message.
    async fn handle(&self, message: Message) -> Result<()>;
}
