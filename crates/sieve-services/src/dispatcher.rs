//! Scan dispatch stage: turn staging object-created events into scan jobs.

use async_trait::async_trait;
use sieve_core::models::ObjectUrl;
use sieve_core::{AppError, Config, JobHandle, Likelihood, ObjectCreated, ScanJobSpec};
use sieve_worker::{Message, MessageHandler};
use std::sync::Arc;
use std::time::Instant;

use crate::classification::ClassificationService;
use crate::error::log_swallowed;

/// Everything the dispatcher needs to build a job spec.
#[derive(Clone, Debug)]
pub struct DispatchSettings {
    /// `projects/{id}`
    pub project_parent: String,
    pub staging_bucket: String,
    /// Scheme of object URLs handed to the classifier (`gs`, `s3`, ...).
    pub url_scheme: String,
    pub info_types: Vec<String>,
    pub min_likelihood: Likelihood,
    pub max_findings: u32,
    /// Fully-qualified completion topic.
    pub notification_topic: String,
}

impl DispatchSettings {
    pub fn from_config(config: &Config, url_scheme: &str) -> Self {
        DispatchSettings {
            project_parent: config.project_parent(),
            staging_bucket: config.staging_bucket().to_string(),
            url_scheme: url_scheme.to_string(),
            info_types: config.info_types().to_vec(),
            min_likelihood: config.min_likelihood(),
            max_findings: config.max_findings(),
            notification_topic: config.notification_topic(),
        }
    }
}

/// Submits one scan job per object created in the staging bucket.
///
/// Stateless: a redelivered event submits a second job.
pub struct ScanDispatcher {
    classifier: Arc<dyn ClassificationService>,
    settings: DispatchSettings,
}

impl ScanDispatcher {
    pub fn new(classifier: Arc<dyn ClassificationService>, settings: DispatchSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Job spec for the staging object `name`.
    pub fn build_spec(&self, name: &str) -> ScanJobSpec {
        ScanJobSpec {
            target_url: ObjectUrl::new(
                &self.settings.url_scheme,
                &self.settings.staging_bucket,
                name,
            )
            .to_string(),
            info_types: self.settings.info_types.clone(),
            min_likelihood: self.settings.min_likelihood,
            max_findings: self.settings.max_findings,
            notification_topic: self.settings.notification_topic.clone(),
        }
    }

    /// Submit a scan job for `event`.
    ///
    /// Events for other buckets are ignored and return `Ok(None)`. Copies
    /// into the destination buckets raise events too.
    pub async fn dispatch(&self, event: &ObjectCreated) -> Result<Option<JobHandle>, AppError> {
        if event.bucket != self.settings.staging_bucket {
            tracing::debug!(
                bucket = %event.bucket,
                object = %event.name,
                "Ignoring object outside the staging bucket"
            );
            return Ok(None);
        }
        if event.name.trim().is_empty() {
            return Err(AppError::InvalidNotification(
                "object-created event has no object name".to_string(),
            ));
        }

        let start = Instant::now();
        let spec = self.build_spec(&event.name);
        let handle = self
            .classifier
            .submit_job(&self.settings.project_parent, &spec)
            .await?;

        tracing::info!(
            object = %event.name,
            job_name = %handle,
            classifier = self.classifier.name(),
            info_types = ?spec.info_types,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Scan job submitted"
        );

        Ok(Some(handle))
    }

    /// Event-source entry point: dispatch and swallow any failure after
    /// logging it. Nothing is retried.
    #[tracing::instrument(skip_all, fields(bucket = %event.bucket, object = %event.name))]
    pub async fn handle(&self, event: &ObjectCreated) -> Option<JobHandle> {
        match self.dispatch(event).await {
            Ok(handle) => handle,
            Err(e) => {
                log_swallowed(&e, "dispatch");
                None
            }
        }
    }
}

#[async_trait]
impl MessageHandler for ScanDispatcher {
    fn name(&self) -> &'static str {
        "scan-dispatcher"
    }

    async fn handle(&self, message: Message) -> anyhow::Result<()> {
        let event: ObjectCreated = message.decode_json()?;
        ScanDispatcher::handle(self, &event).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingClassifier;

    fn settings() -> DispatchSettings {
        DispatchSettings {
            project_parent: "projects/tidal".to_string(),
            staging_bucket: "tl-quarantine-1".to_string(),
            url_scheme: "gs".to_string(),
            info_types: vec![
                "FIRST_NAME".to_string(),
                "PHONE_NUMBER".to_string(),
                "EMAIL_ADDRESS".to_string(),
                "US_SOCIAL_SECURITY_NUMBER".to_string(),
            ],
            min_likelihood: Likelihood::Possible,
            max_findings: 0,
            notification_topic: "projects/tidal/topics/classification".to_string(),
        }
    }

    #[test]
    fn test_build_spec_targets_staging_object() {
        let dispatcher = ScanDispatcher::new(Arc::new(RecordingClassifier::new()), settings());
        let spec = dispatcher.build_spec("reports/q3.csv");

        assert_eq!(spec.target_url, "gs://tl-quarantine-1/reports/q3.csv");
        assert_eq!(spec.info_types, settings().info_types);
        assert_eq!(spec.min_likelihood, Likelihood::Possible);
        assert_eq!(spec.max_findings, 0);
        assert_eq!(spec.notification_topic, "projects/tidal/topics/classification");
    }

    #[tokio::test]
    async fn test_dispatch_submits_under_project() {
        let classifier = Arc::new(RecordingClassifier::new());
        let dispatcher = ScanDispatcher::new(classifier.clone(), settings());

        let handle = dispatcher
            .handle(&ObjectCreated::new("tl-quarantine-1", "report.csv"))
            .await
            .unwrap();

        assert_eq!(handle.as_str(), "projects/tidal/dlpJobs/i-1");
        let submissions = classifier.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].0, "projects/tidal");
        assert_eq!(
            submissions[0].1.target_url,
            "gs://tl-quarantine-1/report.csv"
        );
    }

    #[tokio::test]
    async fn test_other_buckets_are_ignored() {
        let classifier = Arc::new(RecordingClassifier::new());
        let dispatcher = ScanDispatcher::new(classifier.clone(), settings());

        let handle = dispatcher
            .handle(&ObjectCreated::new("tl-sensitive-1", "report.csv"))
            .await;

        assert!(handle.is_none());
        assert!(classifier.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_is_swallowed() {
        let dispatcher = ScanDispatcher::new(Arc::new(RecordingClassifier::failing()), settings());
        let event = ObjectCreated::new("tl-quarantine-1", "report.csv");

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(matches!(err, AppError::JobSubmissionFailure(_)));

        assert!(dispatcher.handle(&event).await.is_none());
    }

    #[tokio::test]
    async fn test_redelivery_submits_duplicate_job() {
        let classifier = Arc::new(RecordingClassifier::new());
        let dispatcher = ScanDispatcher::new(classifier.clone(), settings());
        let event = ObjectCreated::new("tl-quarantine-1", "report.csv");

        dispatcher.handle(&event).await;
        dispatcher.handle(&event).await;

        assert_eq!(classifier.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_message_handler_decodes_event() {
        let classifier = Arc::new(RecordingClassifier::new());
        let dispatcher = ScanDispatcher::new(classifier.clone(), settings());
        let message = Message::json(&ObjectCreated::new("tl-quarantine-1", "notes.txt")).unwrap();

        MessageHandler::handle(&dispatcher, message).await.unwrap();
        assert_eq!(classifier.submissions().len(), 1);

        let garbage = Message::new("not json");
        assert!(MessageHandler::handle(&dispatcher, garbage).await.is_err());
    }
}
