//! `reqwest`-backed catalog client.

use std::sync::Arc;
use std::time::Duration;

use mercado_core::{Product, ProductId, ProductInput, join_url};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{ApiError, ProductApi};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Collection path relative to the resolved root.
const COLLECTION_PATH: &str = "produtos/";

/// HTTP client for the catalog service.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpProductApi {
    inner: Arc<HttpProductApiInner>,
}

struct HttpProductApiInner {
    client: reqwest::Client,
    root: String,
}

impl std::fmt::Debug for HttpProductApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProductApi")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl HttpProductApi {
    /// Create a client rooted at an absolute base address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(root: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(HttpProductApiInner {
                client,
                root: root.into(),
            }),
        })
    }

    /// Create a client from loaded configuration, resolving the base address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the root is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let root = config.api_root()?;
        Ok(Self::new(root, config.request_timeout)?)
    }

    /// The absolute root requests are built from.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    fn collection_url(&self) -> String {
        join_url(&self.inner.root, COLLECTION_PATH)
    }

    fn item_url(&self, id: ProductId) -> String {
        join_url(&self.collection_url(), &format!("{id}/"))
    }

    /// Send a request and check its status, returning the raw body.
    async fn send(request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let body = Self::send(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ProductApi for HttpProductApi {
    #[instrument(skip(self), fields(root = %self.inner.root))]
    async fn list(&self) -> Result<Vec<Product>, ApiError> {
        let products: Vec<Product> =
            Self::send_json(self.inner.client.get(self.collection_url())).await?;
        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    #[instrument(skip(self, input), fields(name = %input.name()))]
    async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let product: Product =
            Self::send_json(self.inner.client.post(self.collection_url()).json(input)).await?;
        debug!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, input), fields(product_id = %id))]
    async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        let product: Product =
            Self::send_json(self.inner.client.put(self.item_url(id)).json(input)).await?;
        debug!("Product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: ProductId) -> Result<(), ApiError> {
        Self::send(self.inner.client.delete(self.item_url(id))).await?;
        debug!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_have_single_separators() {
        let api = HttpProductApi::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.collection_url(), "http://localhost:8000/api/produtos/");
        assert_eq!(
            api.item_url(ProductId::new(12)),
            "http://localhost:8000/api/produtos/12/"
        );
    }

    #[test]
    fn test_from_config_uses_resolved_root() {
        let config = ClientConfig::default().with_api_override("http://backend:8000/api");
        let api = HttpProductApi::from_config(&config).unwrap();
        assert_eq!(api.root(), "http://127.0.0.1:5173/api");
    }

    #[test]
    fn test_debug_shows_root() {
        let api = HttpProductApi::new("http://127.0.0.1:5173/api", Duration::from_secs(1)).unwrap();
        assert!(format!("{api:?}").contains("127.0.0.1:5173"));
    }
}
