//! Application state shared by handlers.

use sieve_core::Config;
use sieve_services::{
    ClassificationService, IntakeService, PubSub, ResultRouter, ScanDispatcher, Storage,
};
use sieve_worker::TopicListener;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Background work owned by the running application.
#[derive(Default)]
pub struct Background {
    pub listeners: Vec<TopicListener>,
    pub tasks: Vec<JoinHandle<()>>,
}

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub pubsub: Arc<dyn PubSub>,
    pub classifier: Arc<dyn ClassificationService>,
    pub intake: IntakeService,
    pub dispatcher: Arc<ScanDispatcher>,
    pub router: Arc<ResultRouter>,
    /// Whether staging writes raise object-created events in-process.
    pub in_process_events: bool,
    pub background: Mutex<Background>,
}

impl AppState {
    /// Stop listeners (waiting for in-flight messages) and abort periodic tasks.
    pub async fn shutdown(&self) {
        let background = std::mem::take(&mut *self.background.lock().await);

        for listener in background.listeners {
            let topic = listener.topic().to_string();
            listener.shutdown().await;
            tracing::debug!(topic = %topic, "Listener stopped");
        }
        for task in background.tasks {
            task.abort();
        }

        tracing::info!("Background work stopped");
    }
}
