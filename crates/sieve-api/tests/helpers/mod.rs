//! Test helpers: build AppState and router for integration tests.
//!
//! Every app runs on in-memory storage and the in-memory transport, so the
//! full pipeline executes inside the test process.

#![allow(dead_code)]

use axum_test::TestServer;
use sieve_api::setup::{routes, services};
use sieve_api::state::AppState;
use sieve_core::{
    BaseConfig, ClassifierBackend, Config, Likelihood, PipelineConfig, StorageBackend,
};
use sieve_services::{ClassificationService, Storage};
use sieve_storage::InMemoryStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub const STAGING: &str = "tl-quarantine-1";
pub const SENSITIVE: &str = "tl-sensitive-1";
pub const NONSENSITIVE: &str = "tl-non-sensitive-1";

/// Test application: server plus the state behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.state.storage
    }
}

pub fn test_config() -> Config {
    Config(Box::new(PipelineConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            max_upload_size_bytes: 1024 * 1024,
        },
        project_id: "tidal".to_string(),
        staging_bucket: STAGING.to_string(),
        sensitive_bucket: SENSITIVE.to_string(),
        nonsensitive_bucket: NONSENSITIVE.to_string(),
        pubsub_topic: "classification".to_string(),
        object_events_topic: "object-created".to_string(),
        info_types: vec![
            "FIRST_NAME".to_string(),
            "PHONE_NUMBER".to_string(),
            "EMAIL_ADDRESS".to_string(),
            "US_SOCIAL_SECURITY_NUMBER".to_string(),
        ],
        min_likelihood: Likelihood::Possible,
        max_findings: 0,
        storage_backend: StorageBackend::Memory,
        local_storage_path: "./storage".to_string(),
        s3_region: None,
        s3_endpoint: None,
        gcs_service_account_path: None,
        classifier_backend: ClassifierBackend::Local,
        dlp_endpoint: "http://127.0.0.1:1".to_string(),
        dlp_access_token: None,
        dlp_timeout_secs: 5,
        listener_max_concurrent: 4,
        reconcile_interval_secs: 0,
        staging_ttl_secs: 3600,
    }))
}

/// App with the local classifier.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(Arc::new(InMemoryStorage::new()), None).await
}

/// App around the given storage and, optionally, a fake classifier.
pub async fn setup_test_app_with(
    storage: Arc<dyn Storage>,
    classifier: Option<Arc<dyn ClassificationService>>,
) -> TestApp {
    let config = test_config();
    let state = services::initialize_services(
        &config,
        storage,
        services::setup_pubsub(),
        classifier,
    )
    .await
    .expect("Failed to initialize services");

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, state }
}

/// Poll until `bucket/name` exists (or no longer exists when `present` is
/// false). Returns whether the expected state was reached.
pub async fn wait_for_object(
    storage: &Arc<dyn Storage>,
    bucket: &str,
    name: &str,
    present: bool,
) -> bool {
    for _ in 0..200 {
        if storage.exists(bucket, name).await.unwrap_or(false) == present {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}
