//! Multipart upload parsing

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use sieve_core::{AppError, Submission};

use crate::constants::UPLOAD_FIELD;

/// Extract the uploaded file from a multipart form.
///
/// Returns `Ok(None)` when the form has no `file` field. A `file` field
/// without a file name becomes a submission with an empty name, which
/// intake rejects as a missing payload. Other fields are ignored and a
/// second `file` field is an error.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
) -> Result<Option<Submission>, AppError> {
    let mut submission: Option<Submission> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart"))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if submission.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data"))?;

        submission = Some(Submission::new(name, content_type, data));
    }

    Ok(submission)
}

/// A body cut off by the upload limit is 413; any other read failure is a
/// malformed form.
fn multipart_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("{}: {}", context, err))
    }
}
