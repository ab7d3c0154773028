//! Result routing stage: move scanned objects out of staging.

use async_trait::async_trait;
use sieve_core::models::ObjectUrl;
use sieve_core::{
    AppError, CompletionNotification, Config, Finding, JobHandle, JobStatus, RoutingDecision,
    JOB_NAME_ATTRIBUTE,
};
use sieve_storage::Storage;
use sieve_worker::{Message, MessageHandler};
use std::sync::Arc;
use std::time::Instant;

use crate::classification::ClassificationService;
use crate::error::log_swallowed;

/// Buckets the router moves objects between.
#[derive(Clone, Debug)]
pub struct RouteTargets {
    pub staging_bucket: String,
    pub sensitive_bucket: String,
    pub nonsensitive_bucket: String,
}

impl RouteTargets {
    pub fn from_config(config: &Config) -> Self {
        RouteTargets {
            staging_bucket: config.staging_bucket().to_string(),
            sensitive_bucket: config.sensitive_bucket().to_string(),
            nonsensitive_bucket: config.nonsensitive_bucket().to_string(),
        }
    }

    pub fn destination(&self, decision: RoutingDecision) -> &str {
        match decision {
            RoutingDecision::Sensitive => &self.sensitive_bucket,
            RoutingDecision::NonSensitive => &self.nonsensitive_bucket,
        }
    }
}

/// Where an object ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub job: JobHandle,
    pub object: String,
    pub decision: RoutingDecision,
    pub destination_bucket: String,
    pub findings: Vec<Finding>,
}

/// Routes a scanned object to the sensitive or non-sensitive bucket and
/// removes the staging copy.
///
/// Copy then delete is not atomic: a crash in between leaves the object in
/// both places. A redelivered notification after a successful route fails
/// with `ObjectNotFound` because the staging copy is gone.
pub struct ResultRouter {
    classifier: Arc<dyn ClassificationService>,
    storage: Arc<dyn Storage>,
    targets: RouteTargets,
}

impl ResultRouter {
    pub fn new(
        classifier: Arc<dyn ClassificationService>,
        storage: Arc<dyn Storage>,
        targets: RouteTargets,
    ) -> Self {
        Self {
            classifier,
            storage,
            targets,
        }
    }

    pub fn targets(&self) -> &RouteTargets {
        &self.targets
    }

    pub async fn route(&self, job: &JobHandle) -> Result<RoutingOutcome, AppError> {
        let start = Instant::now();
        let result = self.classifier.fetch_job(job).await?;

        if result.status != JobStatus::Done {
            return Err(AppError::JobFetchFailure(format!(
                "job {} finished as {}, object left in staging",
                job, result.status
            )));
        }

        let url = ObjectUrl::parse(&result.spec.target_url).ok_or_else(|| {
            AppError::InvalidNotification(format!(
                "job {} has unparseable target {}",
                job, result.spec.target_url
            ))
        })?;
        if url.bucket != self.targets.staging_bucket {
            return Err(AppError::InvalidNotification(format!(
                "job {} targets bucket {}, not staging",
                job, url.bucket
            )));
        }

        let decision = result.routing_decision();
        if decision == RoutingDecision::Sensitive {
            for finding in &result.findings {
                tracing::info!(
                    job_name = %job,
                    object = %url.name,
                    info_type = %finding.info_type,
                    count = finding.count,
                    "Sensitive data found"
                );
            }
        }

        let destination = self.targets.destination(decision);
        self.storage
            .copy(&self.targets.staging_bucket, &url.name, destination)
            .await?;
        self.storage
            .delete(&self.targets.staging_bucket, &url.name)
            .await?;

        tracing::info!(
            job_name = %job,
            object = %url.name,
            decision = %decision,
            destination = %destination,
            total_findings = result.total_findings(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object routed"
        );

        Ok(RoutingOutcome {
            job: job.clone(),
            object: url.name,
            decision,
            destination_bucket: destination.to_string(),
            findings: result.findings,
        })
    }

    /// Event-source entry point: route and swallow any failure after
    /// logging it.
    #[tracing::instrument(skip_all, fields(job_name = %notification.job))]
    pub async fn handle(&self, notification: &CompletionNotification) -> Option<RoutingOutcome> {
        match self.route(&notification.job).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log_swallowed(&e, "route");
                None
            }
        }
    }
}

#[async_trait]
impl MessageHandler for ResultRouter {
    fn name(&self) -> &'static str {
        "result-router"
    }

    async fn handle(&self, message: Message) -> anyhow::Result<()> {
        let notification = CompletionNotification::from_attributes(&message.attributes)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "completion message {} has no {} attribute",
                    message.id,
                    JOB_NAME_ATTRIBUTE
                )
            })?;
        ResultRouter::handle(self, &notification).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{done_job, finding, FailingStorage, RecordingClassifier};
    use bytes::Bytes;
    use sieve_storage::InMemoryStorage;

    const JOB: &str = "projects/tidal/dlpJobs/i-1";

    fn targets() -> RouteTargets {
        RouteTargets {
            staging_bucket: "tl-quarantine-1".to_string(),
            sensitive_bucket: "tl-sensitive-1".to_string(),
            nonsensitive_bucket: "tl-non-sensitive-1".to_string(),
        }
    }

    async fn staged(name: &str) -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .write(
                "tl-quarantine-1",
                name,
                Bytes::from_static(b"payload"),
                "text/plain",
            )
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_findings_route_to_sensitive() {
        let storage = staged("report.csv").await;
        let classifier = RecordingClassifier::new().with_result(done_job(
            JOB,
            "gs://tl-quarantine-1/report.csv",
            vec![finding("EMAIL_ADDRESS", 2)],
        ));
        let router = ResultRouter::new(Arc::new(classifier), storage.clone(), targets());

        let outcome = router.route(&JobHandle::new(JOB)).await.unwrap();

        assert_eq!(outcome.decision, RoutingDecision::Sensitive);
        assert_eq!(outcome.destination_bucket, "tl-sensitive-1");
        assert!(storage.exists("tl-sensitive-1", "report.csv").await.unwrap());
        assert!(!storage.exists("tl-quarantine-1", "report.csv").await.unwrap());
        assert!(!storage
            .exists("tl-non-sensitive-1", "report.csv")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_no_findings_route_to_nonsensitive() {
        let storage = staged("notes.txt").await;
        let classifier = RecordingClassifier::new().with_result(done_job(
            JOB,
            "gs://tl-quarantine-1/notes.txt",
            vec![],
        ));
        let router = ResultRouter::new(Arc::new(classifier), storage.clone(), targets());

        let outcome = router.route(&JobHandle::new(JOB)).await.unwrap();

        assert_eq!(outcome.decision, RoutingDecision::NonSensitive);
        let copied = storage.read("tl-non-sensitive-1", "notes.txt").await.unwrap();
        assert_eq!(copied.data, Bytes::from_static(b"payload"));
        assert_eq!(copied.content_type, "text/plain");
        assert!(!storage.exists("tl-quarantine-1", "notes.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_nested_object_names_survive_recovery() {
        let storage = staged("2024/q3/report.csv").await;
        let classifier = RecordingClassifier::new().with_result(done_job(
            JOB,
            "gs://tl-quarantine-1/2024/q3/report.csv",
            vec![],
        ));
        let router = ResultRouter::new(Arc::new(classifier), storage.clone(), targets());

        let outcome = router.route(&JobHandle::new(JOB)).await.unwrap();
        assert_eq!(outcome.object, "2024/q3/report.csv");
        assert!(storage
            .exists("tl-non-sensitive-1", "2024/q3/report.csv")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_redelivery_is_object_not_found() {
        let storage = staged("report.csv").await;
        let classifier = RecordingClassifier::new().with_result(done_job(
            JOB,
            "gs://tl-quarantine-1/report.csv",
            vec![finding("EMAIL_ADDRESS", 1)],
        ));
        let router = ResultRouter::new(Arc::new(classifier), storage.clone(), targets());

        router.route(&JobHandle::new(JOB)).await.unwrap();
        let err = router.route(&JobHandle::new(JOB)).await.unwrap_err();

        assert!(matches!(err, AppError::ObjectNotFound(_)));
        assert!(router
            .handle(&CompletionNotification {
                job: JobHandle::new(JOB)
            })
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unfinished_job_leaves_object_in_staging() {
        let storage = staged("report.csv").await;
        let mut job = done_job(JOB, "gs://tl-quarantine-1/report.csv", vec![]);
        job.status = JobStatus::Failed;
        let router = ResultRouter::new(
            Arc::new(RecordingClassifier::new().with_result(job)),
            storage.clone(),
            targets(),
        );

        let err = router.route(&JobHandle::new(JOB)).await.unwrap_err();
        assert!(matches!(err, AppError::JobFetchFailure(_)));
        assert!(storage.exists("tl-quarantine-1", "report.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_target_outside_staging_is_rejected() {
        let storage = staged("report.csv").await;
        let classifier = RecordingClassifier::new().with_result(done_job(
            JOB,
            "gs://somewhere-else/report.csv",
            vec![],
        ));
        let router = ResultRouter::new(Arc::new(classifier), storage.clone(), targets());

        let err = router.route(&JobHandle::new(JOB)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidNotification(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_storage_failures() {
        let router = ResultRouter::new(
            Arc::new(RecordingClassifier::failing()),
            Arc::new(InMemoryStorage::new()),
            targets(),
        );
        let err = router.route(&JobHandle::new(JOB)).await.unwrap_err();
        assert!(matches!(err, AppError::JobFetchFailure(_)));

        let router = ResultRouter::new(
            Arc::new(RecordingClassifier::new().with_result(done_job(
                JOB,
                "gs://tl-quarantine-1/report.csv",
                vec![],
            ))),
            Arc::new(FailingStorage),
            targets(),
        );
        let err = router.route(&JobHandle::new(JOB)).await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn test_message_without_job_attribute_is_rejected() {
        let router = ResultRouter::new(
            Arc::new(RecordingClassifier::new()),
            Arc::new(InMemoryStorage::new()),
            targets(),
        );
        let result = MessageHandler::handle(&router, Message::new("")).await;
        assert!(result.is_err());
    }
}
