//! In-process classification service
//!
//! Stands in for the managed DLP service in development and tests. A
//! submitted job is recorded as `RUNNING`, the target object is scanned on a
//! background task, and a completion notification carrying the job name is
//! published to the job's topic once the job is `DONE` (or `FAILED`).
//!
//! Finished jobs are kept for a retention window so the router can fetch
//! them after the notification, then evicted on a later submission.

use async_trait::async_trait;
use sieve_core::models::ObjectUrl;
use sieve_core::{
    Finding, JobHandle, JobResult, JobStatus, ScanJobSpec, JOB_NAME_ATTRIBUTE,
};
use sieve_storage::Storage;
use sieve_worker::{Message, PubSub};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::detectors::{inspect, predefined_detectors, Detector};
use super::ClassificationService;
use crate::error::ClassificationError;

/// How long a finished job stays fetchable.
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

struct JobEntry {
    result: JobResult,
    finished_at: Option<Instant>,
}

#[derive(Clone)]
pub struct LocalClassifier {
    storage: Arc<dyn Storage>,
    pubsub: Arc<dyn PubSub>,
    detectors: Arc<Vec<Detector>>,
    jobs: Arc<RwLock<HashMap<JobHandle, JobEntry>>>,
    retention: Duration,
}

impl LocalClassifier {
    pub fn new(
        storage: Arc<dyn Storage>,
        pubsub: Arc<dyn PubSub>,
    ) -> Result<Self, ClassificationError> {
        Ok(Self {
            storage,
            pubsub,
            detectors: Arc::new(predefined_detectors()?),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention: DEFAULT_JOB_RETENTION,
        })
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Drop finished jobs older than the retention window. Running jobs stay.
    fn prune(jobs: &mut HashMap<JobHandle, JobEntry>, retention: Duration) -> usize {
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.finished_at {
            Some(finished) => finished.elapsed() < retention,
            None => true,
        });
        before - jobs.len()
    }

    /// Scan the job's target, record the outcome, then announce completion.
    async fn run_job(self, handle: JobHandle, spec: ScanJobSpec) {
        let start = Instant::now();

        let (status, findings) = match self.scan(&spec).await {
            Ok(findings) => {
                for finding in &findings {
                    tracing::debug!(
                        job_name = %handle,
                        info_type = %finding.info_type,
                        count = finding.count,
                        "Local scan finding"
                    );
                }
                (JobStatus::Done, findings)
            }
            Err(e) => {
                tracing::error!(
                    job_name = %handle,
                    target = %spec.target_url,
                    error = %e,
                    "Local scan failed"
                );
                (JobStatus::Failed, Vec::new())
            }
        };

        if let Some(entry) = self.jobs.write().await.get_mut(&handle) {
            entry.result.status = status;
            entry.result.findings = findings;
            entry.finished_at = Some(Instant::now());
        }

        tracing::info!(
            job_name = %handle,
            status = %status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local scan finished"
        );

        let message = Message::new(bytes::Bytes::new())
            .with_attribute(JOB_NAME_ATTRIBUTE, handle.as_str());
        if let Err(e) = self
            .pubsub
            .publish(&spec.notification_topic, message)
            .await
        {
            tracing::error!(
                job_name = %handle,
                topic = %spec.notification_topic,
                error = %e,
                "Failed to publish job completion"
            );
        }
    }

    async fn scan(&self, spec: &ScanJobSpec) -> Result<Vec<Finding>, ClassificationError> {
        let url = ObjectUrl::parse(&spec.target_url).ok_or_else(|| {
            ClassificationError::InvalidResponse(format!(
                "Unsupported target url: {}",
                spec.target_url
            ))
        })?;

        let object = self
            .storage
            .read(&url.bucket, &url.name)
            .await
            .map_err(|e| ClassificationError::FetchFailed(format!("{}: {}", url, e)))?;

        let text = String::from_utf8_lossy(&object.data);
        Ok(inspect(
            &self.detectors,
            &text,
            &spec.info_types,
            spec.min_likelihood,
            spec.max_findings,
        ))
    }
}

#[async_trait]
impl ClassificationService for LocalClassifier {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn submit_job(
        &self,
        parent: &str,
        spec: &ScanJobSpec,
    ) -> Result<JobHandle, ClassificationError> {
        if spec.info_types.is_empty() {
            return Err(ClassificationError::SubmitFailed(
                "at least one info type is required".to_string(),
            ));
        }
        if spec.notification_topic.trim().is_empty() {
            return Err(ClassificationError::SubmitFailed(
                "notification topic is required".to_string(),
            ));
        }

        let handle = JobHandle::new(format!("{}/dlpJobs/i-{}", parent, Uuid::new_v4().simple()));

        {
            let mut jobs = self.jobs.write().await;
            let evicted = Self::prune(&mut jobs, self.retention);
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    retained = jobs.len(),
                    "Evicted finished local scan jobs"
                );
            }
            jobs.insert(
                handle.clone(),
                JobEntry {
                    result: JobResult {
                        handle: handle.clone(),
                        status: JobStatus::Running,
                        spec: spec.clone(),
                        findings: Vec::new(),
                    },
                    finished_at: None,
                },
            );
        }

        tracing::info!(
            job_name = %handle,
            target = %spec.target_url,
            "Local scan job created"
        );

        tokio::spawn(self.clone().run_job(handle.clone(), spec.clone()));

        Ok(handle)
    }

    async fn fetch_job(&self, job: &JobHandle) -> Result<JobResult, ClassificationError> {
        self.jobs
            .read()
            .await
            .get(job)
            .map(|entry| entry.result.clone())
            .ok_or_else(|| ClassificationError::JobNotFound(job.to_string()))
    }
}
