//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::constants::{SERVICE_NAME, VERSION};
use crate::state::AppState;
use anyhow::{Context, Result};
use sieve_core::Config;
use sieve_infra::TelemetryConfig;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    sieve_infra::init_telemetry(&TelemetryConfig::new(
        SERVICE_NAME,
        VERSION,
        config.environment(),
    ))
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    // Setup storage and the notification transport
    let storage = storage::setup_storage(&config).await?;
    let pubsub = services::setup_pubsub();

    // Initialize pipeline stages and their listeners
    let state = services::initialize_services(&config, storage, pubsub, None).await?;

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
