//! Directory-backed object backend
//!
//! Objects live at `<root>/<bucket>/<key>`, with `/` in keys mapped to
//! subdirectories. Used for local development and offline runs.

use super::backend::ObjectBackend;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path for an object; keys may not climb out of the bucket
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if bucket.is_empty() || bucket.contains(['/', '\\']) || key.is_empty() || escapes {
            return Err(IngestError::storage(format!("Invalid object address '{}/{}'", bucket, key)));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

fn collect_keys(dir: &Path, bucket_dir: &Path, keys: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_keys(&path, bucket_dir, keys)?;
        } else if let Ok(relative) = path.strip_prefix(bucket_dir) {
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
    }
    Ok(())
}

#[async_trait]
impl ObjectBackend for LocalBackend {
    fn scheme(&self) -> &'static str {
        "file"
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(tokio::fs::metadata(self.object_path(bucket, key)?)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IngestError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(IngestError::storage(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        debug!(bytes = data.len(), content_type, path = %path.display(), "Stored object");
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let bucket_dir = self.root.join(bucket);
        let mut keys = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<String>> {
            let mut keys = Vec::new();
            if bucket_dir.is_dir() {
                collect_keys(&bucket_dir, &bucket_dir, &mut keys)?;
            }
            Ok(keys)
        })
        .await
        .map_err(|e| IngestError::storage(format!("Listing {} failed: {}", bucket, e)))??;

        keys.retain(|k| prefix.is_none_or(|p| k.starts_with(p)));
        keys.sort();
        Ok(keys)
    }
}
