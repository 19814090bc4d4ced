//! Catalog service access.
//!
//! [`ProductApi`] is the seam between the store and the network. The
//! production implementation is [`HttpProductApi`]; tests substitute a
//! scripted fake.
//!
//! # Endpoints
//!
//! - `GET {root}/produtos/` - list every product
//! - `POST {root}/produtos/` - create
//! - `PUT {root}/produtos/{id}/` - replace
//! - `DELETE {root}/produtos/{id}/` - delete

use std::future::Future;

use mercado_core::{Product, ProductId, ProductInput};
use thiserror::Error;

mod http;

pub use http::HttpProductApi;

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Operations the catalog service exposes.
///
/// Uses return-position `impl Future` so implementations can be plain
/// `async fn`s while callers still get `Send` futures.
pub trait ProductApi: Send + Sync {
    /// Fetch the full collection, in service order.
    fn list(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Create a product; returns the service's representation.
    fn create(&self, input: &ProductInput)
    -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Replace a product; returns the service's representation.
    fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Delete a product.
    fn delete(&self, id: ProductId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
