use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use sieve_core::{AppError, IntakeReceipt};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::extract_multipart_file;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always `"Success"`.
    pub message: String,
    #[serde(flatten)]
    pub receipt: IntakeReceipt,
}

/// Stage a file for classification.
///
/// The file goes to the staging bucket under its own name; classification
/// starts from the resulting object-created event.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "intake",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File staged", body = UploadResponse),
        (status = 400, description = "No file in the request", body = sieve_infra::ErrorResponse),
        (status = 413, description = "File exceeds the upload limit", body = sieve_infra::ErrorResponse),
        (status = 500, description = "Staging write failed", body = sieve_infra::ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    // A body that is not multipart at all carries no file either.
    let submission = match multipart {
        Ok(multipart) => extract_multipart_file(multipart).await?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Upload is not a multipart form");
            return Err(AppError::MissingPayload.into());
        }
    };

    let receipt = state.intake.submit(submission).await?;

    Ok(Json(UploadResponse {
        message: "Success".to_string(),
        receipt,
    }))
}
