//! Push endpoints for pipeline notifications.
//!
//! Both endpoints accept a Pub/Sub push envelope. The object-created endpoint
//! also accepts a bare object resource. A well-formed notification is always
//! acknowledged with 204, including when its processing fails: failures are
//! logged and not redelivered.

use axum::{body::Bytes, extract::State, http::StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use sieve_core::{AppError, CompletionNotification, ObjectCreated, JOB_NAME_ATTRIBUTE};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::HttpAppError;
use crate::state::AppState;

/// Storage notification attributes used when the payload is absent.
const BUCKET_ID_ATTRIBUTE: &str = "bucketId";
const OBJECT_ID_ATTRIBUTE: &str = "objectId";
const EVENT_TYPE_ATTRIBUTE: &str = "eventType";
const OBJECT_FINALIZE: &str = "OBJECT_FINALIZE";

/// Pub/Sub push request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64-encoded payload.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl PushMessage {
    fn decoded_data(&self) -> Result<Option<Vec<u8>>, AppError> {
        match self.data.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(data) => STANDARD.decode(data).map(Some).map_err(|e| {
                AppError::InvalidNotification(format!("message data is not base64: {}", e))
            }),
        }
    }
}

fn parse_envelope(body: &[u8]) -> Result<PushEnvelope, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidNotification(format!("invalid push envelope: {}", e)))
}

/// Object-created event carried by `body`, or `None` for storage events
/// other than object creation.
pub fn object_event_from_body(body: &[u8]) -> Result<Option<ObjectCreated>, AppError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidNotification(format!("invalid JSON body: {}", e)))?;

    if value.get("message").is_none() {
        return serde_json::from_value(value).map(Some).map_err(|e| {
            AppError::InvalidNotification(format!("invalid object-created event: {}", e))
        });
    }

    let envelope: PushEnvelope = serde_json::from_value(value)
        .map_err(|e| AppError::InvalidNotification(format!("invalid push envelope: {}", e)))?;
    let message = envelope.message;

    if let Some(event_type) = message.attributes.get(EVENT_TYPE_ATTRIBUTE) {
        if event_type != OBJECT_FINALIZE {
            tracing::debug!(event_type = %event_type, "Ignoring storage event");
            return Ok(None);
        }
    }

    if let Some(data) = message.decoded_data()? {
        return serde_json::from_slice(&data).map(Some).map_err(|e| {
            AppError::InvalidNotification(format!("invalid object-created payload: {}", e))
        });
    }

    match (
        message.attributes.get(BUCKET_ID_ATTRIBUTE),
        message.attributes.get(OBJECT_ID_ATTRIBUTE),
    ) {
        (Some(bucket), Some(name)) => Ok(Some(ObjectCreated::new(bucket, name))),
        _ => Err(AppError::InvalidNotification(
            "object-created message has neither data nor bucketId/objectId".to_string(),
        )),
    }
}

/// Completion notification carried by a push envelope.
pub fn completion_from_body(body: &[u8]) -> Result<CompletionNotification, AppError> {
    let envelope = parse_envelope(body)?;
    CompletionNotification::from_attributes(&envelope.message.attributes).ok_or_else(|| {
        AppError::InvalidNotification(format!(
            "completion message has no {} attribute",
            JOB_NAME_ATTRIBUTE
        ))
    })
}

/// Receive an object-created notification and submit a scan job.
#[utoipa::path(
    post,
    path = "/events/object-created",
    tag = "events",
    request_body(content = PushEnvelope, description = "Pub/Sub push envelope or a bare object resource"),
    responses(
        (status = 204, description = "Notification accepted"),
        (status = 400, description = "Malformed notification", body = sieve_infra::ErrorResponse)
    )
)]
pub async fn object_created(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, HttpAppError> {
    if let Some(event) = object_event_from_body(&body)? {
        state.dispatcher.handle(&event).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Receive a job-completion notification and route the scanned object.
#[utoipa::path(
    post,
    path = "/events/job-completed",
    tag = "events",
    request_body(content = PushEnvelope, description = "Pub/Sub push envelope with a DlpJobName attribute"),
    responses(
        (status = 204, description = "Notification accepted"),
        (status = 400, description = "Missing job name attribute", body = sieve_infra::ErrorResponse)
    )
)]
pub async fn job_completed(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, HttpAppError> {
    let notification = completion_from_body(&body)?;
    state.router.handle(&notification).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_object_resource() {
        let body = json!({"bucket": "tl-quarantine-1", "name": "report.csv", "size": "12"});
        let event = object_event_from_body(body.to_string().as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(event.bucket, "tl-quarantine-1");
        assert_eq!(event.name, "report.csv");
        assert_eq!(event.size, Some(12));
    }

    #[test]
    fn test_push_envelope_with_data() {
        let payload = json!({"bucket": "tl-quarantine-1", "name": "notes.txt"}).to_string();
        let body = json!({
            "message": {
                "data": STANDARD.encode(payload),
                "attributes": {"eventType": "OBJECT_FINALIZE"},
                "messageId": "42",
                "message_id": "42"
            },
            "subscription": "projects/tidal/subscriptions/dispatch"
        });
        let event = object_event_from_body(body.to_string().as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(event.name, "notes.txt");
    }

    #[test]
    fn test_push_envelope_falls_back_to_attributes() {
        let body = json!({
            "message": {"attributes": {"bucketId": "tl-quarantine-1", "objectId": "a/b.csv"}}
        });
        let event = object_event_from_body(body.to_string().as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(event.bucket, "tl-quarantine-1");
        assert_eq!(event.name, "a/b.csv");
    }

    #[test]
    fn test_non_finalize_events_are_ignored() {
        let body = json!({
            "message": {"attributes": {
                "eventType": "OBJECT_DELETE",
                "bucketId": "tl-quarantine-1",
                "objectId": "report.csv"
            }}
        });
        assert!(object_event_from_body(body.to_string().as_bytes())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_object_events() {
        assert!(matches!(
            object_event_from_body(b"not json"),
            Err(AppError::InvalidNotification(_))
        ));
        let body = json!({"message": {"data": "%%%"}});
        assert!(matches!(
            object_event_from_body(body.to_string().as_bytes()),
            Err(AppError::InvalidNotification(_))
        ));
        let body = json!({"message": {}});
        assert!(object_event_from_body(body.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_completion_requires_job_attribute() {
        let body = json!({"message": {"attributes": {"DlpJobName": "projects/tidal/dlpJobs/i-7"}}});
        let notification = completion_from_body(body.to_string().as_bytes()).unwrap();
        assert_eq!(notification.job.as_str(), "projects/tidal/dlpJobs/i-7");

        let body = json!({"message": {"attributes": {}}});
        assert!(matches!(
            completion_from_body(body.to_string().as_bytes()),
            Err(AppError::InvalidNotification(_))
        ));
    }
}
