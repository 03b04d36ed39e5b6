//! Object store access
//!
//! [`ObjectStoreClient`] moves files and tables in and out of a bucket through
//! a pluggable [`ObjectBackend`]: [`S3Backend`] for S3-compatible services and
//! [`LocalBackend`] for a directory tree.

pub mod backend;
pub mod client;
pub mod loaders;
pub mod local;
pub mod s3;

pub use backend::ObjectBackend;
pub use client::{LoadedObject, ObjectStoreClient};
pub use loaders::{load_financial_data, load_product_data, load_review_data, ObjectStoreBackend};
pub use local::LocalBackend;
pub use s3::{S3Backend, StoredCredentials};
