//! Sieve Services Layer
//!
//! This crate is the pipeline's business layer. It hosts the three stages
//! (intake, scan dispatch, result routing), the classification collaborators
//! they talk to, and the storage decorator that turns writes into
//! object-created events. Keep HTTP handling in sieve-api.

pub mod classification;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod intake;
pub mod reconcile;
pub mod router;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(feature = "classifier-dlp")]
pub use classification::dlp::DlpClient;
#[cfg(feature = "classifier-local")]
pub use classification::local::LocalClassifier;
pub use classification::{create_classifier, ClassificationService};
pub use dispatcher::{DispatchSettings, ScanDispatcher};
pub use error::ClassificationError;
pub use events::EventingStorage;
pub use intake::IntakeService;
pub use reconcile::{StaleObject, StagingReconciler};
pub use router::{ResultRouter, RouteTargets, RoutingOutcome};
pub use sieve_storage::{create_storage, Storage, StorageError, StorageResult};
pub use sieve_worker::{InMemoryPubSub, Message, MessageHandler, PubSub, PubSubError};
