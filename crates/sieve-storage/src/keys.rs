//! Shared name validation for storage backends.
//!
//! Object stores accept almost any name, so [`validate`] only rejects what
//! no bucket can hold. [`validate_path`] adds the segment checks needed
//! where names become filesystem paths.

use crate::StorageError;

/// Validate a bucket name: non-empty, a single path segment.
pub fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

/// Validate an object name: non-empty, not `.` or `..`, no CR/LF.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidKey(
            "Object name cannot be empty".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(StorageError::InvalidKey(format!(
            "Invalid object name: {:?}",
            name
        )));
    }
    if name.contains(['\r', '\n']) {
        return Err(StorageError::InvalidKey(
            "Object name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate an object name used as a relative filesystem path: no leading
/// `/`, no NUL, no empty, `.` or `..` segments.
pub fn validate_path_name(name: &str) -> Result<(), StorageError> {
    validate_name(name)?;
    if name.starts_with('/') || name.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Object name contains invalid characters".to_string(),
        ));
    }
    if name
        .split(['/', '\\'])
        .any(|segment| segment == ".." || segment == "." || segment.is_empty())
    {
        return Err(StorageError::InvalidKey(
            "Object name contains invalid path segments".to_string(),
        ));
    }
    Ok(())
}

/// Validate both parts of an object address.
pub fn validate(bucket: &str, name: &str) -> Result<(), StorageError> {
    validate_bucket(bucket)?;
    validate_name(name)
}

/// Validate an object address that maps onto the filesystem.
pub fn validate_path(bucket: &str, name: &str) -> Result<(), StorageError> {
    validate_bucket(bucket)?;
    validate_path_name(name)
}
