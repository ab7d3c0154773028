//! Google Cloud DLP v2 REST client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sieve_core::{Finding, JobHandle, JobResult, JobStatus, Likelihood, ScanJobSpec};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};

use super::ClassificationService;
use crate::error::ClassificationError;

/// DLP jobs API client
///
/// Submits inspect jobs over Cloud Storage objects with a Pub/Sub completion
/// action and reads back their `infoTypeStats`.
pub struct DlpClient {
    http_client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl Debug for DlpClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DlpClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl DlpClient {
    pub fn new(
        endpoint: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, ClassificationError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ClassificationError::ConfigError(format!(
                    "Failed to create HTTP client for DLP API: {}",
                    e
                ))
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn jobs_url(&self, parent: &str) -> String {
        format!("{}/v2/{}/dlpJobs", self.endpoint, parent)
    }

    fn job_url(&self, job: &JobHandle) -> String {
        format!("{}/v2/{}", self.endpoint, job.as_str())
    }
}

#[async_trait]
impl ClassificationService for DlpClient {
    fn name(&self) -> &'static str {
        "dlp"
    }

    async fn submit_job(
        &self,
        parent: &str,
        spec: &ScanJobSpec,
    ) -> Result<JobHandle, ClassificationError> {
        let start = Instant::now();
        let request_body = CreateDlpJobRequest {
            inspect_job: InspectJobConfig::from_spec(spec),
        };

        let response = self
            .http_client
            .post(self.jobs_url(parent))
            .bearer_auth(&self.access_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                ClassificationError::SubmitFailed(format!(
                    "Failed to send request to DLP API: {}",
                    e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassificationError::SubmitFailed(format!(
                "DLP API request failed: {} - {}",
                status, error_text
            )));
        }

        let job: DlpJob = response.json().await.map_err(|e| {
            ClassificationError::SubmitFailed(format!("Failed to parse DLP API response: {}", e))
        })?;

        tracing::info!(
            job_name = %job.name,
            target = %spec.target_url,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "DLP job created"
        );

        Ok(JobHandle::new(job.name))
    }

    async fn fetch_job(&self, job: &JobHandle) -> Result<JobResult, ClassificationError> {
        let response = self
            .http_client
            .get(self.job_url(job))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                ClassificationError::FetchFailed(format!(
                    "Failed to send request to DLP API: {}",
                    e
                ))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClassificationError::JobNotFound(job.to_string()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassificationError::FetchFailed(format!(
                "DLP API request failed: {} - {}",
                status, error_text
            )));
        }

        let dlp_job: DlpJob = response.json().await.map_err(|e| {
            ClassificationError::InvalidResponse(format!(
                "Failed to parse DLP API response: {}",
                e
            ))
        })?;

        dlp_job.into_job_result()
    }
}

// Wire types. Only the fields the pipeline reads or writes are modelled.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDlpJobRequest {
    inspect_job: InspectJobConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectJobConfig {
    #[serde(default)]
    storage_config: Option<StorageConfig>,
    #[serde(default)]
    inspect_config: Option<InspectConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    actions: Vec<Action>,
}

impl InspectJobConfig {
    fn from_spec(spec: &ScanJobSpec) -> Self {
        InspectJobConfig {
            storage_config: Some(StorageConfig {
                cloud_storage_options: Some(CloudStorageOptions {
                    file_set: Some(FileSet {
                        url: spec.target_url.clone(),
                    }),
                }),
            }),
            inspect_config: Some(InspectConfig {
                info_types: spec
                    .info_types
                    .iter()
                    .map(|name| InfoType { name: name.clone() })
                    .collect(),
                min_likelihood: Some(spec.min_likelihood.as_str().to_string()),
                limits: Some(FindingLimits {
                    max_findings_per_request: spec.max_findings,
                }),
            }),
            actions: vec![Action {
                pub_sub: Some(PublishToPubSub {
                    topic: spec.notification_topic.clone(),
                }),
            }],
        }
    }

    fn target_url(&self) -> Option<&str> {
        self.storage_config
            .as_ref()?
            .cloud_storage_options
            .as_ref()?
            .file_set
            .as_ref()
            .map(|f| f.url.as_str())
    }

    /// Rebuild the submitted spec. DLP omits defaulted fields, so a missing
    /// likelihood reads as `POSSIBLE` and a missing cap as 0.
    fn to_spec(&self) -> Option<ScanJobSpec> {
        let target_url = self.target_url()?.to_string();
        let inspect = self.inspect_config.as_ref();

        Some(ScanJobSpec {
            target_url,
            info_types: inspect
                .map(|c| c.info_types.iter().map(|t| t.name.clone()).collect())
                .unwrap_or_default(),
            min_likelihood: inspect
                .and_then(|c| c.min_likelihood.as_deref())
                .and_then(|l| l.parse::<Likelihood>().ok())
                .unwrap_or(Likelihood::Possible),
            max_findings: inspect
                .and_then(|c| c.limits.as_ref())
                .map(|l| l.max_findings_per_request)
                .unwrap_or(0),
            notification_topic: self
                .actions
                .iter()
                .find_map(|a| a.pub_sub.as_ref().map(|p| p.topic.clone()))
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageConfig {
    #[serde(default)]
    cloud_storage_options: Option<CloudStorageOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudStorageOptions {
    #[serde(default)]
    file_set: Option<FileSet>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileSet {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectConfig {
    #[serde(default)]
    info_types: Vec<InfoType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_likelihood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limits: Option<FindingLimits>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InfoType {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingLimits {
    #[serde(default)]
    max_findings_per_request: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub_sub: Option<PublishToPubSub>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PublishToPubSub {
    topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DlpJob {
    name: String,
    #[serde(default)]
    state: Option<JobStatus>,
    #[serde(default)]
    inspect_details: Option<InspectDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectDetails {
    #[serde(default)]
    requested_options: Option<RequestedOptions>,
    #[serde(default)]
    result: Option<InspectResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestedOptions {
    #[serde(default)]
    job_config: Option<InspectJobConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResult {
    #[serde(default)]
    info_type_stats: Vec<InfoTypeStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoTypeStats {
    info_type: InfoType,
    #[serde(with = "sieve_core::models::int64")]
    count: u64,
}

impl DlpJob {
    fn into_job_result(self) -> Result<JobResult, ClassificationError> {
        let details = self.inspect_details.unwrap_or(InspectDetails {
            requested_options: None,
            result: None,
        });

        let spec = details
            .requested_options
            .as_ref()
            .and_then(|o| o.job_config.as_ref())
            .and_then(InspectJobConfig::to_spec)
            .ok_or_else(|| {
                ClassificationError::InvalidResponse(format!(
                    "Job {} has no cloudStorageOptions.fileSet.url",
                    self.name
                ))
            })?;

        let findings = details
            .result
            .map(|r| r.info_type_stats)
            .unwrap_or_default()
            .into_iter()
            .map(|stat| Finding {
                info_type: stat.info_type.name,
                count: stat.count,
            })
            .collect();

        Ok(JobResult {
            handle: JobHandle::new(self.name),
            status: self.state.unwrap_or(JobStatus::JobStateUnspecified),
            spec,
            findings,
        })
    }
}
