use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Minimum confidence a detector must reach before a match counts as a finding.
///
/// Ordered from weakest to strongest so thresholds compare with `>=`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }

    /// Whether a match at this likelihood passes `threshold`.
    pub fn meets(&self, threshold: Likelihood) -> bool {
        *self >= threshold
    }
}

impl FromStr for Likelihood {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "VERY_UNLIKELY" => Ok(Likelihood::VeryUnlikely),
            "UNLIKELY" => Ok(Likelihood::Unlikely),
            "POSSIBLE" => Ok(Likelihood::Possible),
            "LIKELY" => Ok(Likelihood::Likely),
            "VERY_LIKELY" => Ok(Likelihood::VeryLikely),
            _ => Err(anyhow::anyhow!("Invalid likelihood: {}", s)),
        }
    }
}

impl Display for Likelihood {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a classification job, e.g. `projects/p/dlpJobs/i-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(name: impl Into<String>) -> Self {
        JobHandle(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for JobHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for JobHandle {
    fn from(value: String) -> Self {
        JobHandle(value)
    }
}

impl From<&str> for JobHandle {
    fn from(value: &str) -> Self {
        JobHandle(value.to_string())
    }
}

/// Lifecycle state reported by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Active,
    Done,
    Canceled,
    Failed,
    #[serde(other)]
    JobStateUnspecified,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Canceled | JobStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Active => "ACTIVE",
            JobStatus::Done => "DONE",
            JobStatus::Canceled => "CANCELED",
            JobStatus::Failed => "FAILED",
            JobStatus::JobStateUnspecified => "JOB_STATE_UNSPECIFIED",
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified object location, `{scheme}://{bucket}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
    pub scheme: String,
    pub bucket: String,
    pub name: String,
}

impl ObjectUrl {
    pub fn new(scheme: &str, bucket: &str, name: &str) -> Self {
        ObjectUrl {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            name: name.to_string(),
        }
    }

    /// Split a URL into scheme, bucket and object name. The name keeps any
    /// `/` separators it contains.
    pub fn parse(url: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        let (bucket, name) = rest.split_once('/')?;
        if scheme.is_empty() || bucket.is_empty() || name.is_empty() {
            return None;
        }
        Some(ObjectUrl::new(scheme, bucket, name))
    }
}

impl Display for ObjectUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.name)
    }
}

/// One classification request. Built fresh per staging object and never
/// mutated after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanJobSpec {
    /// Staging location of the object to inspect.
    pub target_url: String,
    /// Detection categories, in configured order.
    pub info_types: Vec<String>,
    pub min_likelihood: Likelihood,
    /// Findings cap. 0 means the service default.
    pub max_findings: u32,
    /// Fully-qualified topic the completion notification is published to.
    pub notification_topic: String,
}

/// Number of matches for one detection category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    pub info_type: String,
    pub count: u64,
}

/// Outcome of a finished job as fetched from the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub handle: JobHandle,
    pub status: JobStatus,
    pub spec: ScanJobSpec,
    pub findings: Vec<Finding>,
}

impl JobResult {
    pub fn routing_decision(&self) -> RoutingDecision {
        RoutingDecision::from_findings(&self.findings)
    }

    pub fn total_findings(&self) -> u64 {
        self.findings.iter().map(|f| f.count).sum()
    }
}

/// Destination chosen for a scanned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDecision {
    Sensitive,
    NonSensitive,
}

impl RoutingDecision {
    /// Any finding at all makes the object sensitive.
    pub fn from_findings(findings: &[Finding]) -> Self {
        if findings.is_empty() {
            RoutingDecision::NonSensitive
        } else {
            RoutingDecision::Sensitive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::Sensitive => "sensitive",
            RoutingDecision::NonSensitive => "non_sensitive",
        }
    }
}

impl Display for RoutingDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likelihood_ordering() {
        assert!(Likelihood::Likely.meets(Likelihood::Possible));
        assert!(Likelihood::Possible.meets(Likelihood::Possible));
        assert!(!Likelihood::Unlikely.meets(Likelihood::Possible));
        assert_eq!(
            "very-likely".parse::<Likelihood>().unwrap(),
            Likelihood::VeryLikely
        );
        assert!("sometimes".parse::<Likelihood>().is_err());
    }

    #[test]
    fn test_likelihood_wire_format() {
        let json = serde_json::to_string(&Likelihood::VeryUnlikely).unwrap();
        assert_eq!(json, "\"VERY_UNLIKELY\"");
    }

    #[test]
    fn test_object_url_parse_keeps_nested_name() {
        let url = ObjectUrl::parse("gs://staging/reports/2024/q1.csv").unwrap();
        assert_eq!(url.scheme, "gs");
        assert_eq!(url.bucket, "staging");
        assert_eq!(url.name, "reports/2024/q1.csv");
        assert_eq!(url.to_string(), "gs://staging/reports/2024/q1.csv");
    }

    #[test]
    fn test_object_url_parse_rejects_malformed() {
        assert!(ObjectUrl::parse("staging/file.txt").is_none());
        assert!(ObjectUrl::parse("gs://staging").is_none());
        assert!(ObjectUrl::parse("gs://staging/").is_none());
        assert!(ObjectUrl::parse("gs:///file.txt").is_none());
    }

    #[test]
    fn test_routing_decision_from_findings() {
        assert_eq!(
            RoutingDecision::from_findings(&[]),
            RoutingDecision::NonSensitive
        );
        let findings = vec![Finding {
            info_type: "EMAIL_ADDRESS".to_string(),
            count: 1,
        }];
        assert_eq!(
            RoutingDecision::from_findings(&findings),
            RoutingDecision::Sensitive
        );
    }

    #[test]
    fn test_unknown_job_state_is_tolerated() {
        let status: JobStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, JobStatus::JobStateUnspecified);
        assert!(!status.is_terminal());
        assert!(JobStatus::Done.is_terminal());
    }
}
