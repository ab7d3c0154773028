//! HTTP error response body
//!
//! The `IntoResponse` implementation for `AppError` lives in the binary crate
//! (sieve-api): the orphan rule forbids implementing axum's trait for
//! sieve-core's type here.

use serde::Serialize;
use sieve_core::{AppError, ErrorMetadata};
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message, kept for clients of the original intake endpoint.
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Build the body for `error`. Details and the error type are only
    /// included when `include_details` is set and the error is not marked
    /// sensitive.
    pub fn from_app_error(error: &AppError, include_details: bool) -> Self {
        let message = error.client_message();
        let show_details = include_details && !error.is_sensitive();
        let details = show_details
            .then(|| error.detailed_message())
            .filter(|d| *d != message);

        ErrorResponse {
            error: message.clone(),
            message,
            details,
            error_type: show_details.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(str::to_string),
        }
    }
}
