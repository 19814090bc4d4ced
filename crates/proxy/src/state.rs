//! Shared proxy state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;

/// State handed to every forwarding request.
///
/// Cheap to clone; clones share one upstream connection pool.
#[derive(Clone)]
pub struct ProxyState {
    inner: Arc<ProxyStateInner>,
}

struct ProxyStateInner {
    client: reqwest::Client,
    upstream: String,
}

impl std::fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyState")
            .field("upstream", &self.inner.upstream)
            .finish_non_exhaustive()
    }
}

impl ProxyState {
    /// Build state forwarding to `upstream`.
    ///
    /// Redirects are passed back to the caller rather than followed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(upstream: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            inner: Arc::new(ProxyStateInner {
                client,
                upstream: upstream.into(),
            }),
        })
    }

    /// Build state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.upstream.clone(), config.request_timeout)
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.inner.upstream
    }
}
