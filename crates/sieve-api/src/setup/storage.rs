//! Storage backend setup

use anyhow::{Context, Result};
use sieve_core::Config;
use sieve_services::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        staging_bucket = %config.staging_bucket(),
        sensitive_bucket = %config.sensitive_bucket(),
        nonsensitive_bucket = %config.nonsensitive_bucket(),
        "Storage initialized"
    );

    Ok(storage)
}
