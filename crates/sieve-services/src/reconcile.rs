//! Stale staging report.
//!
//! Routing copies then deletes, and a lost notification or a failed job
//! leaves the object in staging indefinitely. The reconciler lists staging
//! and reports objects older than a TTL. It never moves or deletes anything;
//! re-driving them is an operator decision.

use chrono::{DateTime, Utc};
use sieve_core::AppError;
use sieve_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleObject {
    pub name: String,
    pub size: u64,
    pub age_secs: u64,
}

#[derive(Clone)]
pub struct StagingReconciler {
    storage: Arc<dyn Storage>,
    staging_bucket: String,
    ttl: Duration,
}

impl StagingReconciler {
    pub fn new(storage: Arc<dyn Storage>, staging_bucket: impl Into<String>, ttl: Duration) -> Self {
        Self {
            storage,
            staging_bucket: staging_bucket.into(),
            ttl,
        }
    }

    /// Staging objects last modified more than the TTL before `now`, oldest first.
    #[tracing::instrument(skip(self), fields(bucket = %self.staging_bucket))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<StaleObject>, AppError> {
        let objects = self.storage.list(&self.staging_bucket).await?;
        let ttl_secs = self.ttl.as_secs();

        let mut stale: Vec<StaleObject> = objects
            .into_iter()
            .filter_map(|object| {
                let age_secs = u64::try_from((now - object.last_modified).num_seconds()).ok()?;
                (age_secs > ttl_secs).then_some(StaleObject {
                    name: object.name,
                    size: object.size,
                    age_secs,
                })
            })
            .collect();
        stale.sort_by(|a, b| b.age_secs.cmp(&a.age_secs));

        for object in &stale {
            tracing::warn!(
                object = %object.name,
                age_secs = object.age_secs,
                size_bytes = object.size,
                "Stale object in staging"
            );
        }

        Ok(stale)
    }

    /// Start the background sweep. Returns a JoinHandle for shutdown.
    pub fn start(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(every);

            loop {
                sweep_interval.tick().await;

                match self.sweep(Utc::now()).await {
                    Ok(stale) => {
                        tracing::info!(stale = stale.len(), "Staging sweep completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Staging sweep failed");
                    }
                }
            }
        })
    }
}
