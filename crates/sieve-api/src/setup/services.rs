//! Pipeline wiring: decorate storage, build the three stages and start the
//! listeners that connect them.

use anyhow::{Context, Result};
use sieve_core::{Config, StorageBackend};
use sieve_services::{
    create_classifier, ClassificationService, DispatchSettings, EventingStorage,
    InMemoryPubSub, IntakeService, PubSub, ResultRouter, RouteTargets, ScanDispatcher,
    StagingReconciler, Storage,
};
use sieve_worker::{ListenerConfig, TopicListener};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::state::{AppState, Background};

pub fn setup_pubsub() -> Arc<dyn PubSub> {
    Arc::new(InMemoryPubSub::default())
}

/// Memory and local backends have no native bucket notifications.
fn needs_in_process_events(backend: StorageBackend) -> bool {
    matches!(backend, StorageBackend::Memory | StorageBackend::Local)
}

/// Build every pipeline component around the given collaborators.
///
/// `classifier` overrides the configured classification backend.
pub async fn initialize_services(
    config: &Config,
    storage: Arc<dyn Storage>,
    pubsub: Arc<dyn PubSub>,
    classifier: Option<Arc<dyn ClassificationService>>,
) -> Result<Arc<AppState>> {
    let backend = storage.backend_type();
    let in_process_events = needs_in_process_events(backend);

    let storage: Arc<dyn Storage> = if in_process_events {
        Arc::new(EventingStorage::new(
            storage,
            pubsub.clone(),
            config.object_events_topic(),
        ))
    } else {
        storage
    };

    let classifier = match classifier {
        Some(classifier) => classifier,
        None => create_classifier(config, storage.clone(), pubsub.clone())
            .context("Failed to initialize classification service")?,
    };
    tracing::info!(classifier = classifier.name(), "Classification service initialized");

    let intake = IntakeService::new(storage.clone(), config.staging_bucket());
    let dispatcher = Arc::new(ScanDispatcher::new(
        classifier.clone(),
        DispatchSettings::from_config(config, backend.url_scheme()),
    ));
    let router = Arc::new(ResultRouter::new(
        classifier.clone(),
        storage.clone(),
        RouteTargets::from_config(config),
    ));

    let listener_config = ListenerConfig {
        max_concurrent: config.listener_max_concurrent(),
    };
    let mut background = Background::default();

    background.listeners.push(
        TopicListener::start(
            pubsub.clone(),
            &config.object_events_topic(),
            dispatcher.clone(),
            listener_config.clone(),
        )
        .await
        .context("Failed to subscribe to object-created events")?,
    );
    background.listeners.push(
        TopicListener::start(
            pubsub.clone(),
            &config.notification_topic(),
            router.clone(),
            listener_config,
        )
        .await
        .context("Failed to subscribe to completion notifications")?,
    );

    if config.reconcile_interval_secs() > 0 {
        let reconciler = Arc::new(StagingReconciler::new(
            storage.clone(),
            config.staging_bucket(),
            Duration::from_secs(config.staging_ttl_secs()),
        ));
        background
            .tasks
            .push(reconciler.start(Duration::from_secs(config.reconcile_interval_secs())));
        tracing::info!(
            interval_secs = config.reconcile_interval_secs(),
            ttl_secs = config.staging_ttl_secs(),
            "Staging reconciler started"
        );
    }

    tracing::info!(
        in_process_events = in_process_events,
        object_events_topic = %config.object_events_topic(),
        notification_topic = %config.notification_topic(),
        "Pipeline initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        storage,
        pubsub,
        classifier,
        intake,
        dispatcher,
        router,
        in_process_events,
        background: Mutex::new(background),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_local_backends_emit_in_process() {
        assert!(needs_in_process_events(StorageBackend::Memory));
        assert!(needs_in_process_events(StorageBackend::Local));
        assert!(!needs_in_process_events(StorageBackend::S3));
        assert!(!needs_in_process_events(StorageBackend::Gcs));
    }
}
