/// Service name reported in logs and the health endpoint.
pub const SERVICE_NAME: &str = "sieve-api";

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multipart field that carries the uploaded file.
pub const UPLOAD_FIELD: &str = "file";
