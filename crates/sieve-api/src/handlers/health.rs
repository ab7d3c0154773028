use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::constants::{SERVICE_NAME, VERSION};
use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub storage: ComponentHealth,
    pub classifier: String,
    pub staging_bucket: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub backend: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness plus a staging bucket probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Staging bucket unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let staging = state.intake.staging_bucket();

    let probe = tokio::time::timeout(
        CHECK_TIMEOUT,
        state.storage.exists(staging, ".sieve-health"),
    )
    .await;
    let error = match probe {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("timed out after {}s", CHECK_TIMEOUT.as_secs())),
    };

    if let Some(ref e) = error {
        tracing::warn!(error = %e, bucket = %staging, "Storage health check failed");
    }

    let healthy = error.is_none();
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        storage: ComponentHealth {
            backend: state.storage.backend_type().to_string(),
            healthy,
            error,
        },
        classifier: state.classifier.name().to_string(),
        staging_bucket: staging.to_string(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
