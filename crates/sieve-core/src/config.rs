//! Configuration module
//!
//! Loads service and pipeline settings from the environment (and `.env`).
//! `Config` wraps the loaded `PipelineConfig` and exposes getters so callers
//! never reach into the struct layout directly.

use std::env;

use crate::classifier_types::ClassifierBackend;
use crate::models::Likelihood;
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8080;
const DEFAULT_INFO_TYPES: &str = "FIRST_NAME,PHONE_NUMBER,EMAIL_ADDRESS,US_SOCIAL_SECURITY_NUMBER";

/// Service-level configuration (HTTP server and environment)
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub max_upload_size_bytes: usize,
}

/// Classification pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    /// Project namespace id; jobs and topics live under `projects/{project_id}`.
    pub project_id: String,
    pub staging_bucket: String,
    pub sensitive_bucket: String,
    pub nonsensitive_bucket: String,
    /// Completion topic id (not fully qualified).
    pub pubsub_topic: String,
    /// Topic id for in-process object-created events.
    pub object_events_topic: String,
    pub info_types: Vec<String>,
    pub min_likelihood: Likelihood,
    pub max_findings: u32,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub gcs_service_account_path: Option<String>,
    // Classification service configuration
    pub classifier_backend: ClassifierBackend,
    pub dlp_endpoint: String,
    pub dlp_access_token: Option<String>,
    pub dlp_timeout_secs: u64,
    // Listener / background tasks
    pub listener_max_concurrent: usize,
    /// Interval between stale-staging sweeps. 0 = disabled.
    pub reconcile_interval_secs: u64,
    pub staging_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    fn as_pipeline(&self) -> &PipelineConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_pipeline().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PipelineConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_pipeline().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_pipeline().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_pipeline().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_pipeline().base.environment
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_pipeline().base.max_upload_size_bytes
    }

    pub fn project_id(&self) -> &str {
        &self.as_pipeline().project_id
    }

    /// Parent resource for job submission, `projects/{project_id}`.
    pub fn project_parent(&self) -> String {
        format!("projects/{}", self.as_pipeline().project_id)
    }

    pub fn staging_bucket(&self) -> &str {
        &self.as_pipeline().staging_bucket
    }

    pub fn sensitive_bucket(&self) -> &str {
        &self.as_pipeline().sensitive_bucket
    }

    pub fn nonsensitive_bucket(&self) -> &str {
        &self.as_pipeline().nonsensitive_bucket
    }

    /// Fully-qualified completion topic, `projects/{project_id}/topics/{topic}`.
    pub fn notification_topic(&self) -> String {
        self.qualify_topic(&self.as_pipeline().pubsub_topic)
    }

    /// Fully-qualified object-created topic.
    pub fn object_events_topic(&self) -> String {
        self.qualify_topic(&self.as_pipeline().object_events_topic)
    }

    fn qualify_topic(&self, topic: &str) -> String {
        if topic.starts_with("projects/") {
            topic.to_string()
        } else {
            format!("{}/topics/{}", self.project_parent(), topic)
        }
    }

    pub fn info_types(&self) -> &[String] {
        &self.as_pipeline().info_types
    }

    pub fn min_likelihood(&self) -> Likelihood {
        self.as_pipeline().min_likelihood
    }

    pub fn max_findings(&self) -> u32 {
        self.as_pipeline().max_findings
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_pipeline().storage_backend
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_pipeline().local_storage_path
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_pipeline().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_pipeline().s3_endpoint.as_deref()
    }

    pub fn gcs_service_account_path(&self) -> Option<&str> {
        self.as_pipeline().gcs_service_account_path.as_deref()
    }

    pub fn classifier_backend(&self) -> ClassifierBackend {
        self.as_pipeline().classifier_backend
    }

    pub fn dlp_endpoint(&self) -> &str {
        &self.as_pipeline().dlp_endpoint
    }

    pub fn dlp_access_token(&self) -> Option<&str> {
        self.as_pipeline().dlp_access_token.as_deref()
    }

    pub fn dlp_timeout_secs(&self) -> u64 {
        self.as_pipeline().dlp_timeout_secs
    }

    pub fn listener_max_concurrent(&self) -> usize {
        self.as_pipeline().listener_max_concurrent
    }

    pub fn reconcile_interval_secs(&self) -> u64 {
        self.as_pipeline().reconcile_interval_secs
    }

    pub fn staging_ttl_secs(&self) -> u64 {
        self.as_pipeline().staging_ttl_secs
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn required_var(primary: &str, fallback: Option<&str>) -> Result<String, anyhow::Error> {
    let value = env::var(primary)
        .ok()
        .or_else(|| fallback.and_then(|name| env::var(name).ok()));
    match (value, fallback) {
        (Some(v), _) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        (_, Some(fallback)) => Err(anyhow::anyhow!("{} or {} must be set", primary, fallback)),
        (_, None) => Err(anyhow::anyhow!("{} must be set", primary)),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_UPLOAD_SIZE_MB: usize = 32;
        const MAX_FINDINGS: u32 = 0;
        const DLP_TIMEOUT_SECS: u64 = 30;
        const LISTENER_MAX_CONCURRENT: usize = 8;
        const RECONCILE_INTERVAL_SECS: u64 = 0;
        const STAGING_TTL_SECS: u64 = 3600;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins: split_list(&cors_origins_str),
            environment,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
        };

        let min_likelihood = env::var("MIN_LIKELIHOOD")
            .unwrap_or_else(|_| Likelihood::Possible.to_string())
            .parse::<Likelihood>()
            .map_err(|e| anyhow::anyhow!("MIN_LIKELIHOOD: {}", e))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| StorageBackend::Local.to_string())
            .parse::<StorageBackend>()?;

        let classifier_backend = env::var("CLASSIFIER_BACKEND")
            .unwrap_or_else(|_| ClassifierBackend::Local.to_string())
            .parse::<ClassifierBackend>()?;

        let config = PipelineConfig {
            base,
            project_id: required_var("PROJECT_ID", None)?,
            staging_bucket: required_var("STAGING_BUCKET", Some("CLOUD_STORAGE_BUCKET"))?,
            sensitive_bucket: required_var("SENSITIVE_BUCKET", None)?,
            nonsensitive_bucket: required_var("NONSENSITIVE_BUCKET", None)?,
            pubsub_topic: env::var("PUBSUB_TOPIC").unwrap_or_else(|_| "classification".to_string()),
            object_events_topic: env::var("OBJECT_EVENTS_TOPIC")
                .unwrap_or_else(|_| "object-created".to_string()),
            info_types: split_list(
                &env::var("INFO_TYPES").unwrap_or_else(|_| DEFAULT_INFO_TYPES.to_string()),
            ),
            min_likelihood,
            max_findings: env::var("MAX_FINDINGS")
                .unwrap_or_else(|_| MAX_FINDINGS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_FINDINGS must be a non-negative integer"))?,
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./storage".to_string()),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            gcs_service_account_path: env::var("GCS_SERVICE_ACCOUNT_PATH")
                .or_else(|_| env::var("GOOGLE_APPLICATION_CREDENTIALS"))
                .ok(),
            classifier_backend,
            dlp_endpoint: env::var("DLP_ENDPOINT")
                .unwrap_or_else(|_| "https://dlp.googleapis.com".to_string()),
            dlp_access_token: env::var("DLP_ACCESS_TOKEN").ok(),
            dlp_timeout_secs: env::var("DLP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DLP_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DLP_TIMEOUT_SECS),
            listener_max_concurrent: env::var("LISTENER_MAX_CONCURRENT")
                .unwrap_or_else(|_| LISTENER_MAX_CONCURRENT.to_string())
                .parse()
                .unwrap_or(LISTENER_MAX_CONCURRENT),
            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .unwrap_or_else(|_| RECONCILE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RECONCILE_INTERVAL_SECS),
            staging_ttl_secs: env::var("STAGING_TTL_SECS")
                .unwrap_or_else(|_| STAGING_TTL_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_TTL_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.project_id.trim().is_empty() {
            return Err(anyhow::anyhow!("PROJECT_ID cannot be empty"));
        }

        for (var, bucket) in [
            ("STAGING_BUCKET", &self.staging_bucket),
            ("SENSITIVE_BUCKET", &self.sensitive_bucket),
            ("NONSENSITIVE_BUCKET", &self.nonsensitive_bucket),
        ] {
            if bucket.trim().is_empty() {
                return Err(anyhow::anyhow!("{} cannot be empty", var));
            }
            if bucket.contains('/') {
                return Err(anyhow::anyhow!("{} must be a bare bucket name", var));
            }
        }

        if self.staging_bucket == self.sensitive_bucket
            || self.staging_bucket == self.nonsensitive_bucket
        {
            return Err(anyhow::anyhow!(
                "STAGING_BUCKET must differ from both destination buckets"
            ));
        }

        if self.sensitive_bucket == self.nonsensitive_bucket {
            return Err(anyhow::anyhow!(
                "SENSITIVE_BUCKET and NONSENSITIVE_BUCKET must differ"
            ));
        }

        if self.info_types.is_empty() {
            return Err(anyhow::anyhow!("INFO_TYPES must list at least one category"));
        }

        if self.pubsub_topic.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBSUB_TOPIC cannot be empty"));
        }

        if self.listener_max_concurrent == 0 {
            return Err(anyhow::anyhow!("LISTENER_MAX_CONCURRENT cannot be 0"));
        }

        if is_production_env(&self.base.environment)
            && self.base.cors_origins.iter().any(|o| o == "*")
        {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.classifier_backend {
            ClassifierBackend::Dlp => {
                if self.dlp_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "DLP_ACCESS_TOKEN must be set when using the dlp classifier backend"
                    ));
                }
                if self.storage_backend != StorageBackend::Gcs {
                    return Err(anyhow::anyhow!(
                        "CLASSIFIER_BACKEND=dlp requires STORAGE_BACKEND=gcs; DLP only reads gs:// objects"
                    ));
                }
            }
            ClassifierBackend::Local => {}
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH cannot be empty when using local storage backend"
                    ));
                }
            }
            StorageBackend::Gcs | StorageBackend::Memory => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pipeline_config() -> PipelineConfig {
        PipelineConfig {
            base: BaseConfig {
                server_port: 8080,
                cors_origins: vec!["*".to_string()],
                environment: "test".to_string(),
                max_upload_size_bytes: 1024 * 1024,
            },
            project_id: "tidal-copilot".to_string(),
            staging_bucket: "quarantine".to_string(),
            sensitive_bucket: "sensitive".to_string(),
            nonsensitive_bucket: "non-sensitive".to_string(),
            pubsub_topic: "classification".to_string(),
            object_events_topic: "object-created".to_string(),
            info_types: split_list(DEFAULT_INFO_TYPES),
            min_likelihood: Likelihood::Possible,
            max_findings: 0,
            storage_backend: StorageBackend::Memory,
            local_storage_path: "./storage".to_string(),
            s3_region: None,
            s3_endpoint: None,
            gcs_service_account_path: None,
            classifier_backend: ClassifierBackend::Local,
            dlp_endpoint: "https://dlp.googleapis.com".to_string(),
            dlp_access_token: None,
            dlp_timeout_secs: 30,
            listener_max_concurrent: 4,
            reconcile_interval_secs: 0,
            staging_ttl_secs: 3600,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_pipeline_config().validate().is_ok());
    }

    #[test]
    fn test_topics_are_qualified_under_project() {
        let config = Config(Box::new(test_pipeline_config()));
        assert_eq!(config.project_parent(), "projects/tidal-copilot");
        assert_eq!(
            config.notification_topic(),
            "projects/tidal-copilot/topics/classification"
        );

        let mut raw = test_pipeline_config();
        raw.pubsub_topic = "projects/other/topics/done".to_string();
        let config = Config(Box::new(raw));
        assert_eq!(config.notification_topic(), "projects/other/topics/done");
    }

    #[test]
    fn test_staging_must_differ_from_destinations() {
        let mut config = test_pipeline_config();
        config.sensitive_bucket = config.staging_bucket.clone();
        assert!(config.validate().is_err());

        let mut config = test_pipeline_config();
        config.nonsensitive_bucket = config.sensitive_bucket.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dlp_backend_requires_token() {
        let mut config = test_pipeline_config();
        config.classifier_backend = ClassifierBackend::Dlp;
        assert!(config.validate().is_err());
        config.dlp_access_token = Some("ya29.token".to_string());
        config.storage_backend = StorageBackend::Gcs;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dlp_backend_requires_gcs_storage() {
        for backend in [StorageBackend::Memory, StorageBackend::Local, StorageBackend::S3] {
            let mut config = test_pipeline_config();
            config.classifier_backend = ClassifierBackend::Dlp;
            config.dlp_access_token = Some("ya29.token".to_string());
            config.s3_region = Some("us-east-1".to_string());
            config.storage_backend = backend;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("STORAGE_BACKEND=gcs"));
        }
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut config = test_pipeline_config();
        config.base.environment = "production".to_string();
        assert!(config.validate().is_err());
        config.base.cors_origins = vec!["https://upload.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" EMAIL_ADDRESS, ,PHONE_NUMBER,"),
            vec!["EMAIL_ADDRESS".to_string(), "PHONE_NUMBER".to_string()]
        );
    }
}
