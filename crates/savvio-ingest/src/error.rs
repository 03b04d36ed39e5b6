//! Error taxonomy for ingestion
//!
//! Transport and retryable HTTP failures are absorbed by the API client up to
//! its retry budget; every other kind propagates straight to the caller.

use savvio_common::CommonError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// HTTP status codes worth another attempt
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Error, Debug)]
pub enum IngestError {
    /// Timeout or connection failure
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx response, with the server's `Retry-After` hint if it sent one
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    /// Response body was not valid JSON
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Object '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Credentials file not found: {}", .0.display())]
    CredentialNotFound(PathBuf),

    #[error("Download of {uri} did not produce {}", .path.display())]
    DownloadVerification { uri: String, path: PathBuf },

    #[error("Unsupported format: '{0}'. Use 'csv' or 'json'")]
    UnsupportedFormat(String),

    #[error("Unsupported data source: '{0}'. Must be 'gcs' or 'api'")]
    UnsupportedSource(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Config(Vec<String>),

    /// Object store backend failure other than a missing object
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Whether the API client may try the request again
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Transport { .. } => true,
            IngestError::Http { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            _ => false,
        }
    }

    /// Server-requested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            IngestError::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            IngestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CommonError> for IngestError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Io(e) => IngestError::Io(e),
            CommonError::Serialization(e) => IngestError::Serialization(e),
            CommonError::Csv(e) => IngestError::Csv(e.to_string()),
            CommonError::UnsupportedFormat(f) => IngestError::UnsupportedFormat(f),
            CommonError::InvalidShape(msg) => IngestError::InvalidShape(msg),
        }
    }
}
