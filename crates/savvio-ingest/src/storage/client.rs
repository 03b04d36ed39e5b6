//! Object store client: file transfers and table loading on top of an
//! [`ObjectBackend`]

use super::backend::ObjectBackend;
use super::local::LocalBackend;
use super::s3::S3Backend;
use crate::config::{StorageConfig, StorageProvider};
use crate::error::{IngestError, Result};
use savvio_common::sink::{self, FileFormat};
use savvio_common::Table;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of decoding a downloaded object
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedObject {
    /// CSV, or a JSON array of records
    Table(Table),
    /// Any other JSON document
    Document(Value),
}

impl LoadedObject {
    /// The table, or [`IngestError::InvalidShape`] for a bare document
    pub fn into_table(self, uri: &str) -> Result<Table> {
        match self {
            LoadedObject::Table(table) => Ok(table),
            LoadedObject::Document(doc) => Err(IngestError::invalid_shape(format!(
                "{} holds a JSON {} instead of an array of records",
                uri,
                if doc.is_object() { "object" } else { "scalar" }
            ))),
        }
    }
}

#[derive(Clone)]
pub struct ObjectStoreClient {
    backend: Arc<dyn ObjectBackend>,
    temp_dir: PathBuf,
}

impl ObjectStoreClient {
    /// Connect the configured provider
    ///
    /// A configured credential file must exist. Without one, ambient
    /// credentials are used.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        if let Some(path) = &config.credentials_path {
            if !path.exists() {
                return Err(IngestError::CredentialNotFound(path.clone()));
            }
        }

        let backend: Arc<dyn ObjectBackend> = match config.provider {
            StorageProvider::S3 => Arc::new(S3Backend::connect(config).await?),
            StorageProvider::Local => Arc::new(LocalBackend::new(&config.local_root)),
        };

        info!(
            provider = ?config.provider,
            project_id = config.project_id.as_deref().unwrap_or("-"),
            "Object store client initialized"
        );

        Ok(Self {
            backend,
            temp_dir: config.temp_dir.clone(),
        })
    }

    pub fn with_backend(backend: impl ObjectBackend + 'static, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Arc::new(backend),
            temp_dir: temp_dir.into(),
        }
    }

    /// `scheme://bucket/key`
    pub fn uri(&self, bucket: &str, key: &str) -> String {
        format!("{}://{}/{}", self.backend.scheme(), bucket, key)
    }

    /// Download an object to `dest`, creating parent directories
    ///
    /// Nothing is written locally when the object does not exist.
    #[instrument(skip(self, dest))]
    pub async fn download(&self, bucket: &str, key: &str, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let dest = dest.as_ref();
        let uri = self.uri(bucket, key);

        if !self.backend.exists(bucket, key).await? {
            return Err(IngestError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        info!(uri = %uri, dest = %dest.display(), "Downloading object");
        let data = self.backend.get(bucket, key).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &data).await?;

        let metadata = tokio::fs::metadata(dest).await.map_err(|_| IngestError::DownloadVerification {
            uri: uri.clone(),
            path: dest.to_path_buf(),
        })?;
        info!(bytes = metadata.len(), path = %dest.display(), "Downloaded object");

        Ok(dest.to_path_buf())
    }

    /// Upload a local file and return its URI
    #[instrument(skip(self, source))]
    pub async fn upload(
        &self,
        bucket: &str,
        source: impl AsRef<Path>,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<String> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(IngestError::SourceNotFound(source.to_path_buf()));
        }

        let data = tokio::fs::read(source).await?;
        let uri = self.uri(bucket, key);
        info!(source = %source.display(), bytes = data.len(), uri = %uri, "Uploading file");

        self.backend.put(bucket, key, data, content_type).await?;
        info!(uri = %uri, "Upload complete");
        Ok(uri)
    }

    /// Download an object and decode it
    pub async fn load_table(
        &self,
        bucket: &str,
        key: &str,
        dest: impl AsRef<Path>,
        format: FileFormat,
    ) -> Result<LoadedObject> {
        let path = self.download(bucket, key, dest).await?;
        info!(path = %path.display(), format = %format, "Loading table");

        let loaded = match format {
            FileFormat::Csv => LoadedObject::Table(sink::read_table(&path, FileFormat::Csv)?),
            FileFormat::Json => match sink::read_json(&path)? {
                array @ Value::Array(_) => LoadedObject::Table(Table::from_json(array)?),
                document => {
                    let keys = document.as_object().map(|m| m.len()).unwrap_or(0);
                    info!(top_level_keys = keys, "Loaded JSON document");
                    LoadedObject::Document(document)
                },
            },
        };

        if let LoadedObject::Table(table) = &loaded {
            info!(
                rows = table.row_count(),
                columns = table.column_count(),
                column_names = ?table.columns(),
                "Loaded table"
            );
        }
        Ok(loaded)
    }

    /// Serialize a table to a temporary file and upload it
    ///
    /// The temporary file is removed whether or not the upload succeeds.
    pub async fn upload_table(&self, table: &Table, bucket: &str, key: &str, format: &str) -> Result<String> {
        let format: FileFormat = format.parse()?;
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let file_name = Path::new(key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("table.{}", format.extension()));
        let temp = tempfile::Builder::new()
            .prefix("temp_")
            .suffix(&format!("_{}", file_name))
            .tempfile_in(&self.temp_dir)?;

        info!(rows = table.row_count(), format = %format, "Saving table for upload");
        sink::write_table(table, temp.path(), format)?;

        self.upload(bucket, temp.path(), key, Some(format.content_type())).await
    }

    pub async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let keys = self.backend.list(bucket, prefix).await?;
        info!(count = keys.len(), "Found objects in {}", self.uri(bucket, prefix.unwrap_or("")));
        Ok(keys)
    }
}
