//! Notification transport and message listeners.
//!
//! [`PubSub`] is the publish/subscribe collaborator the pipeline stages talk
//! through; [`InMemoryPubSub`] implements it in-process. [`TopicListener`]
//! drives a subscription through a [`MessageHandler`] with bounded
//! concurrency.

pub mod handler;
pub mod listener;
pub mod pubsub;

pub use handler::MessageHandler;
pub use listener::{ListenerConfig, TopicListener};
pub use pubsub::{InMemoryPubSub, Message, MessageStream, PubSub, PubSubError};
