//! Sieve API Library
//!
//! HTTP surface of the classification pipeline: the upload endpoint, push
//! endpoints for object-created and job-completed notifications, and the
//! wiring that connects storage, the notification transport and the
//! classifier.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod utils;
