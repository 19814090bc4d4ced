//! Proxy configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PROXY_HOST` - Bind address (default: 127.0.0.1)
//! - `PROXY_PORT` - Listen port (default: 5173)
//! - `PROXY_UPSTREAM` - Catalog service target, including its path prefix
//!   (falls back to `MERCADO_API_URL`, then `http://localhost:8000/api`)
//! - `PROXY_STATIC_DIR` - Directory served for paths outside `/api`
//! - `PROXY_TIMEOUT_SECS` - Upstream request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_UPSTREAM: &str = "http://localhost:8000/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upstream target, without trailing slash
    pub upstream: String,
    /// Optional static directory for non-`/api` paths
    pub static_dir: Option<PathBuf>,
    /// Timeout for each upstream request
    pub request_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("PROXY_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_HOST".to_string(), e.to_string()))?;
        let port = get("PROXY_PORT")
            .unwrap_or_else(|| "5173".to_string())
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PROXY_PORT".to_string(), e.to_string()))?;

        let (upstream_key, upstream) = get("PROXY_UPSTREAM")
            .map(|v| ("PROXY_UPSTREAM", v))
            .or_else(|| get("MERCADO_API_URL").map(|v| ("MERCADO_API_URL", v)))
            .unwrap_or(("PROXY_UPSTREAM", DEFAULT_UPSTREAM.to_string()));
        let upstream = upstream.trim().trim_end_matches('/').to_string();
        Url::parse(&upstream)
            .map_err(|e| ConfigError::InvalidEnvVar(upstream_key.to_string(), e.to_string()))?;

        let timeout_secs = match get("PROXY_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("PROXY_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => 30,
        };

        let sentry_sample_rate = get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            upstream,
            static_dir: get("PROXY_STATIC_DIR").map(PathBuf::from),
            request_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
