//! Sieve Storage Library
//!
//! This crate provides the object store abstraction used by the pipeline and
//! its implementations: in-memory, local filesystem, and cloud object stores
//! (S3 and Google Cloud Storage through `object_store`).
//!
//! # Object addressing
//!
//! Objects are addressed by `(bucket, name)`. Names may contain `/` but must
//! not be empty, start with `/`, or contain a `..` segment. Validation lives
//! in the `keys` module so every backend applies the same rules.

#[cfg(feature = "storage-cloud")]
pub mod cloud;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloud")]
pub use cloud::CloudStorage;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::InMemoryStorage;
pub use sieve_core::StorageBackend;
pub use traits::{ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
