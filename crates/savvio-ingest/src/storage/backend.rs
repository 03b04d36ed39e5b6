//! Byte-level object store abstraction

use crate::error::Result;
use async_trait::async_trait;

/// A flat key/value object store addressed by bucket and key
///
/// Implementations report a missing object from [`ObjectBackend::get`] as
/// [`crate::IngestError::ObjectNotFound`] and every other backend failure as
/// [`crate::IngestError::Storage`].
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// URI scheme used when naming objects, e.g. `s3`
    fn scheme(&self) -> &'static str;

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()>;

    /// Keys under `prefix`, every key when `None`
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>>;
}
