use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::scan::JobHandle;

/// Message attribute carrying the finished job's name on completion notifications.
pub const JOB_NAME_ATTRIBUTE: &str = "DlpJobName";

/// "Object created" event emitted by the object store.
///
/// Field names follow the Cloud Storage object resource so bucket
/// notifications can be consumed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCreated {
    pub bucket: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(
        default,
        with = "crate::models::int64::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

impl ObjectCreated {
    pub fn new(bucket: &str, name: &str) -> Self {
        ObjectCreated {
            bucket: bucket.to_string(),
            name: name.to_string(),
            content_type: None,
            size: None,
            time_created: None,
        }
    }
}

/// Job-completion notification published by the classification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotification {
    pub job: JobHandle,
}

impl CompletionNotification {
    /// Read the job handle from message attributes. Returns `None` when the
    /// attribute is missing or blank.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Option<Self> {
        attributes
            .get(JOB_NAME_ATTRIBUTE)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| CompletionNotification {
                job: JobHandle::new(s),
            })
    }

    pub fn to_attributes(&self) -> HashMap<String, String> {
        HashMap::from([(JOB_NAME_ATTRIBUTE.to_string(), self.job.to_string())])
    }
}
