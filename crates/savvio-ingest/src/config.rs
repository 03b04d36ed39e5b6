//! Configuration management
//!
//! All settings are read once from the environment (a `.env` file is honored
//! for local development), validated once, and passed by value into the
//! clients. Every problem found during validation is reported together.

use crate::dataset::{Dataset, DatasetTargets};
use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Default deployment environment.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Default data source when the environment does not pin one.
pub const DEFAULT_DATA_SOURCE: &str = "gcs";

/// Default bucket holding the raw datasets.
pub const DEFAULT_BUCKET: &str = "savvio-data-bucket";

/// Default local data directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default S3 region.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Default API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.savvio.com/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every API request.
pub const DEFAULT_USER_AGENT: &str = "SavVio-Pipeline/1.0";

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default first backoff; doubles on every retry.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
/// Longest `Retry-After` wait honoured before a retry
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Default pause between page requests.
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

/// Default records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default query parameter names for pagination.
pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_LIMIT_PARAM: &str = "limit";

// ============================================================================
// Types
// ============================================================================

/// Which backend the orchestrator loads from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    ObjectStore,
    Api,
    /// Kept verbatim so the orchestrator can name it in its error
    Unsupported(String),
}

impl DataSource {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "gcs" | "s3" | "storage" | "object-store" | "object_store" => DataSource::ObjectStore,
            "api" => DataSource::Api,
            _ => DataSource::Unsupported(value.to_string()),
        }
    }

    /// `dev` always reads object storage, `prod` always reads the API;
    /// anything else defers to the explicit source setting
    pub fn for_environment(environment: &str, explicit: Option<&str>) -> Self {
        match environment {
            "dev" => DataSource::ObjectStore,
            "prod" => DataSource::Api,
            _ => DataSource::parse(explicit.unwrap_or(DEFAULT_DATA_SOURCE)),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::ObjectStore => f.write_str("object-store"),
            DataSource::Api => f.write_str("api"),
            DataSource::Unsupported(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// AWS S3 or any S3-compatible endpoint
    S3,
    /// Directory tree laid out as `<root>/<bucket>/<key>`
    Local,
}

impl std::str::FromStr for StorageProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" | "minio" => Ok(StorageProvider::S3),
            "local" | "file" | "fs" => Ok(StorageProvider::Local),
            other => Err(format!("STORAGE_PROVIDER '{}' is not one of s3, local", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub bucket: String,
    /// Credential file; ambient credentials are used when unset
    pub credentials_path: Option<PathBuf>,
    pub project_id: Option<String>,
    pub endpoint: Option<String>,
    pub region: String,
    pub path_style: bool,
    /// Root directory of the local provider
    pub local_root: PathBuf,
    /// Scratch directory for upload staging
    pub temp_dir: PathBuf,
}

impl StorageConfig {
    /// Local directory-backed storage, handy for development and tests
    pub fn local(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            provider: StorageProvider::Local,
            bucket: bucket.into(),
            credentials_path: None,
            project_id: None,
            endpoint: None,
            region: DEFAULT_S3_REGION.to_string(),
            path_style: false,
            temp_dir: root.join(".tmp"),
            local_root: root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time
    pub backoff_base: Duration,
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Delay before retry `retry`, preferring a server `Retry-After` hint
    ///
    /// Hints are capped at [`MAX_RETRY_AFTER_SECS`].
    pub fn delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(Duration::from_secs(MAX_RETRY_AFTER_SECS)),
            None => self.backoff(retry),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_pages: Option<u32>,
    pub page_param: String,
    pub limit_param: String,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            limit_param: DEFAULT_LIMIT_PARAM.to_string(),
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryConfig,
    pub pagination: PaginationConfig,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// Complete ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub environment: String,
    pub data_source: DataSource,
    pub data_dir: PathBuf,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub datasets: DatasetTargets,
}

impl IngestConfig {
    /// Load `.env`, read the environment, and validate
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the process environment without validating
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    ///
    /// Values that are present but unparseable are collected and reported in
    /// a single [`IngestError::Config`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();
        let var = |names: &[&str]| names.iter().find_map(|name| lookup(name).filter(|v| !v.is_empty()));

        let mut number = |name: &str, default: u64| -> u64 {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    problems.push(format!("{} must be a non-negative integer, got '{}'", name, raw));
                    default
                }),
                None => default,
            }
        };

        let timeout_secs = number("API_TIMEOUT", DEFAULT_API_TIMEOUT_SECS);
        let max_retries = number("API_MAX_RETRIES", u64::from(DEFAULT_MAX_RETRIES));
        let backoff_ms = number("API_BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS);
        let page_delay_ms = number("API_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS);
        let page_size = number("API_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64);
        let max_pages = number("API_MAX_PAGES", 0);

        let environment = var(&["ENVIRONMENT"]).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let data_source = DataSource::for_environment(&environment, var(&["DATA_SOURCE"]).as_deref());
        let data_dir = PathBuf::from(var(&["DATA_DIR"]).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let provider = match var(&["STORAGE_PROVIDER"]) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                problems.push(e);
                StorageProvider::S3
            }),
            None => StorageProvider::S3,
        };

        let storage = StorageConfig {
            provider,
            bucket: var(&["STORAGE_BUCKET", "GCS_BUCKET_NAME", "S3_BUCKET"])
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            credentials_path: var(&["STORAGE_CREDENTIALS_PATH", "GCP_CREDENTIALS_PATH"]).map(PathBuf::from),
            project_id: var(&["STORAGE_PROJECT_ID", "GCP_PROJECT_ID"]),
            endpoint: var(&["S3_ENDPOINT"]),
            region: var(&["S3_REGION", "AWS_REGION"]).unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            path_style: var(&["S3_PATH_STYLE"])
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            local_root: var(&["STORAGE_ROOT"])
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("object-store")),
            temp_dir: data_dir.join("temp"),
        };

        let base_url = var(&["API_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let pagination = PaginationConfig {
            page_size: page_size as usize,
            max_pages: (max_pages > 0).then_some(max_pages as u32),
            page_param: var(&["API_PAGE_PARAM"]).unwrap_or_else(|| DEFAULT_PAGE_PARAM.to_string()),
            limit_param: var(&["API_LIMIT_PARAM"]).unwrap_or_else(|| DEFAULT_LIMIT_PARAM.to_string()),
            page_delay: Duration::from_millis(page_delay_ms),
        };

        let api = ApiConfig {
            api_key: var(&["API_KEY"]),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig {
                max_retries: max_retries.min(u64::from(u32::MAX)) as u32,
                backoff_base: Duration::from_millis(backoff_ms),
            },
            pagination,
            base_url,
        };

        let mut datasets = DatasetTargets::with_defaults(&data_dir);
        for dataset in Dataset::ALL {
            let prefix = dataset.name().to_uppercase();
            let target = datasets.get_mut(dataset);
            if let Some(key) = var(&[format!("{}_BLOB", prefix).as_str()]) {
                target.object_key = key;
            }
            if let Some(endpoint) = var(&[format!("{}_API_ENDPOINT", prefix).as_str()]) {
                target.endpoint = endpoint_path(&api.base_url, &endpoint);
            }
            if let Some(path) = var(&[format!("{}_RAW_PATH", prefix).as_str()]) {
                target.local_path = PathBuf::from(path);
            }
        }

        if !problems.is_empty() {
            return Err(IngestError::Config(problems));
        }

        Ok(Self {
            environment,
            data_source,
            data_dir,
            storage,
            api,
            datasets,
        })
    }

    /// Check required settings for the selected source
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        match self.data_source {
            DataSource::ObjectStore => {
                if self.storage.bucket.trim().is_empty() {
                    errors.push("STORAGE_BUCKET is required for object-store data source".to_string());
                }
                if self.storage.provider == StorageProvider::Local
                    && self.storage.local_root.as_os_str().is_empty()
                {
                    errors.push("STORAGE_ROOT is required for the local storage provider".to_string());
                }
            },
            DataSource::Api => {
                if self.api.base_url.trim().is_empty() {
                    errors.push("API_BASE_URL is required for API data source".to_string());
                } else if !self.api.base_url.starts_with("http://")
                    && !self.api.base_url.starts_with("https://")
                {
                    errors.push(format!("API_BASE_URL must be an http(s) URL, got '{}'", self.api.base_url));
                }
                if self.api.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
                    errors.push("API_KEY is required for API data source".to_string());
                }
                if self.api.pagination.page_size == 0 {
                    errors.push("API_PAGE_SIZE must be greater than 0".to_string());
                }
                if self.api.timeout.is_zero() {
                    errors.push("API_TIMEOUT must be greater than 0".to_string());
                }
            },
            // Reported by the orchestrator so no work starts
            DataSource::Unsupported(_) => {},
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IngestError::Config(errors))
        }
    }

    /// Settings worth logging; never includes the API key
    pub fn summary(&self) -> Map<String, Value> {
        let mut summary = Map::new();
        summary.insert("environment".into(), json!(self.environment));
        summary.insert("data_source".into(), json!(self.data_source.to_string()));
        summary.insert("storage_provider".into(), json!(self.storage.provider));
        summary.insert("bucket".into(), json!(self.storage.bucket));
        summary.insert("project_id".into(), json!(self.storage.project_id));
        summary.insert("api_base_url".into(), json!(self.api.base_url));
        summary.insert("api_key_set".into(), json!(self.api.api_key.is_some()));
        summary.insert("page_size".into(), json!(self.api.pagination.page_size));
        summary.insert("max_retries".into(), json!(self.api.retry.max_retries));
        summary.insert("data_dir".into(), json!(self.data_dir.display().to_string()));
        summary
    }
}

/// Reduce a configured endpoint to a path under `base_url`
///
/// Endpoints may be configured as full URLs (`https://api/v1/financial`) or
/// plain paths (`/financial`).
pub fn endpoint_path(base_url: &str, endpoint: &str) -> String {
    let path = endpoint.strip_prefix(base_url).unwrap_or(endpoint);
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
