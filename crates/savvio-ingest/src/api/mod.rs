//! SavVio data API access
//!
//! - [`client`]: authenticated JSON requests with retry
//! - [`pagination`]: page-number pagination and response shape probing
//! - [`loaders`]: the three dataset loaders and the API ingestion backend

pub mod client;
pub mod loaders;
pub mod pagination;

pub use client::ApiClient;
pub use loaders::{load_financial_data, load_product_data, load_review_data, ApiBackend};
pub use pagination::{FetchSession, PageBody};
pub use reqwest::Method;
