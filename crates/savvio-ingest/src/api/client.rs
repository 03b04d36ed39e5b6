//! HTTP client for the SavVio data API
//!
//! Wraps a configured [`reqwest::Client`] with bearer authentication, JSON
//! decoding and retry with exponential backoff for transient failures.

use crate::config::{ApiConfig, PaginationConfig, RetryConfig};
use crate::error::{IngestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method};
use savvio_common::sink::{self, FileFormat};
use savvio_common::table::records_from_values;
use savvio_common::{Record, Table};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// API client for the SavVio data service
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
    pub(crate) pagination: PaginationConfig,
}

impl ApiClient {
    /// Create a client from API settings
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = config.api_key.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
                IngestError::Config(vec!["API_KEY contains characters not allowed in a header".to_string()])
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| IngestError::Transport {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, authenticated = config.api_key.is_some(), "API client initialized");

        Ok(Self {
            client,
            base_url,
            retry: config.retry,
            pagination: config.pagination,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Make one logical request, retrying transient failures
    ///
    /// Transport errors and statuses 429/500/502/503/504 are retried up to
    /// `max_retries` times, waiting `backoff_base * 2^n` before retry `n`
    /// unless the response carries a `Retry-After` delay in seconds. Once the
    /// budget is spent the last error is returned unchanged.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(endpoint);
        let mut retry = 0;

        loop {
            match self.send_once(&url, method.clone(), query, body).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay(retry, err.retry_after());
                    warn!(
                        url = %url,
                        attempt = retry + 1,
                        status = ?err.status(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                },
                Err(err) => {
                    error!(
                        url = %url,
                        attempt = retry + 1,
                        status = ?err.status(),
                        error = %err,
                        "Request failed"
                    );
                    return Err(err);
                },
            }
        }
    }

    /// GET an endpoint with optional query parameters
    pub async fn get(&self, endpoint: &str, query: Option<&[(String, String)]>) -> Result<Value> {
        self.request(endpoint, Method::GET, query, None).await
    }

    async fn send_once(
        &self,
        url: &str,
        method: Method,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let transport = |e: reqwest::Error| IngestError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut builder = self.client.request(method, url);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(IngestError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
                retry_after,
            });
        }

        serde_json::from_str(&text).map_err(|e| IngestError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Persist records as `json` or `csv` (case-insensitive)
    pub fn save_to_file(&self, records: &[Record], path: impl AsRef<Path>, format: &str) -> Result<PathBuf> {
        let format: FileFormat = format.parse()?;
        Ok(sink::write_records(records, path, format)?)
    }

    /// Fetch an endpoint, save it locally and return it as a table
    ///
    /// Without pagination an array body is used as-is and any other body
    /// becomes a single record.
    pub async fn fetch_and_save(
        &self,
        endpoint: &str,
        path: impl AsRef<Path>,
        format: &str,
        paginate: bool,
    ) -> Result<Table> {
        let records = if paginate {
            self.fetch_with_pagination(endpoint, &[], self.pagination.page_size, self.pagination.max_pages)
                .await?
        } else {
            let body = self.get(endpoint, None).await?;
            let items = match body {
                Value::Array(items) => items,
                other => vec![other],
            };
            records_from_values(items)?
        };

        self.save_to_file(&records, path, format)?;

        let table = Table::from_records(records);
        info!(rows = table.row_count(), columns = table.column_count(), "Converted to table");
        Ok(table)
    }
}

/// `Retry-After` in delta-seconds form; HTTP dates are ignored
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
