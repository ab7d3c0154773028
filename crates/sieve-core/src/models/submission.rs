use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fallback content type when the client does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A named payload submitted for classification.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Submission {
    pub fn new(name: impl Into<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Submission {
            name: name.into(),
            content_type: content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Acknowledgement returned once a submission is in the staging store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IntakeReceipt {
    pub bucket: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_content_type_defaults() {
        let s = Submission::new("a.bin", None, vec![1u8, 2, 3]);
        assert_eq!(s.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(s.size(), 3);

        let s = Submission::new("a.txt", Some(" ".to_string()), Bytes::new());
        assert_eq!(s.content_type, DEFAULT_CONTENT_TYPE);
    }
}
