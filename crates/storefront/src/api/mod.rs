//! Koshimart REST API adapter.
//!
//! # Architecture
//!
//! - [`ApiClient`] joins paths to the base URL, attaches headers and the
//!   session's bearer token, and normalizes failures into [`ApiError`]
//! - [`Transport`] performs the actual I/O ([`HttpTransport`] in production)
//! - Endpoint helpers are grouped by backend area in `auth`, `store`,
//!   `customer` and `vendor`, all as methods on [`ApiClient`]
//!
//! # Example
//!
//! ```rust,ignore
//! use koshimart_storefront::api::ApiClient;
//! use koshimart_storefront::config::StorefrontConfig;
//!
//! let client = ApiClient::new(&StorefrontConfig::from_env()?, None)?;
//! let products = client.safely_fetch_products().await;
//! let reviews = client.safely_fetch_reviews(Some("undefined")).await; // [] without a request
//! ```

mod auth;
mod client;
mod customer;
mod error;
mod store;
mod transport;
pub mod types;
mod vendor;

pub use auth::MIN_PASSWORD_LEN;
pub use client::{ApiClient, CredentialProvider};
pub use error::ApiError;
pub use store::RATING_RANGE;
pub use transport::{ApiRequest, HttpTransport, RawResponse, RequestBody, Transport};
pub use types::*;
