//! S3 object backend
//!
//! Works against AWS S3 or any S3-compatible endpoint (MinIO in development).

use super::backend::ObjectBackend;
use crate::config::StorageConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Static keys read from a credential file
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl StoredCredentials {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IngestError::CredentialNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Build a client from a credential file, or from ambient credentials
    /// (environment, profile, instance metadata) when none is configured
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        match &config.credentials_path {
            Some(path) => {
                let stored = StoredCredentials::from_file(path)?;
                loader = loader.credentials_provider(Credentials::new(
                    stored.access_key_id,
                    stored.secret_access_key,
                    stored.session_token,
                    None,
                    "savvio-credentials-file",
                ));
                info!(path = %path.display(), "S3 client using credentials file");
            },
            None => info!("S3 client using ambient credentials"),
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self::from_client(Client::from_conf(builder.build())))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Existence check through a one-byte ranged GET, whose error body names
    /// `NoSuchKey` even where HEAD is denied
    async fn exists_via_get(&self, bucket: &str, key: &str) -> Result<bool> {
        match self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .range("bytes=0-0")
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => Ok(false),
            // Zero-length objects cannot satisfy the range
            Err(e) if e.raw_response().is_some_and(|r| r.status().as_u16() == 416) => Ok(true),
            Err(e) => Err(IngestError::storage(format!(
                "Failed to check s3://{}/{}: {}",
                bucket, key, e
            ))),
        }
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn scheme(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self))]
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            // HEAD answers 403 for missing keys without s3:ListBucket
            Err(e) if e.raw_response().is_some_and(|r| r.status().as_u16() == 403) => {
                debug!("HEAD s3://{}/{} forbidden, checking with GET", bucket, key);
                self.exists_via_get(bucket, key).await
            },
            Err(e) => Err(IngestError::storage(format!(
                "Failed to check s3://{}/{}: {}",
                bucket, key, e
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(IngestError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            },
            Err(e) => {
                return Err(IngestError::storage(format!(
                    "Failed to download s3://{}/{}: {}",
                    bucket, key, e
                )))
            },
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| IngestError::storage(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        debug!(bytes = data.len(), "Downloaded from s3://{}/{}", bucket, key);
        Ok(data)
    }

    #[instrument(skip(self, data))]
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let size = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| IngestError::storage(format!("Failed to upload to s3://{}/{}: {}", bucket, key, e)))?;

        debug!(bytes = size, "Uploaded to s3://{}/{}", bucket, key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| IngestError::storage(format!("Failed to list s3://{}: {}", bucket, e)))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                },
                _ => break,
            }
        }

        Ok(keys)
    }
}
