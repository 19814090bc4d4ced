//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MERCADO_API_URL` - Catalog service override (default: empty, meaning
//!   "go through the proxy")
//! - `MERCADO_ORIGIN` - Origin the relative `/api` base is resolved against
//!   (default: `http://127.0.0.1:5173`, the proxy's default address)
//! - `MERCADO_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `MERCADO_KEEP_DRAFT_ON_FAILURE` - Keep the draft when a save fails
//!   (default: false)

use std::time::Duration;

use mercado_core::{join_url, resolve_base};
use thiserror::Error;
use url::Url;

use crate::session::DraftRetention;

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5173";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Raw override string fed to the endpoint resolver
    pub api_override: String,
    /// Origin used when the resolved base is relative
    pub origin: Url,
    /// Timeout applied to every catalog request
    pub request_timeout: Duration,
    /// What happens to the draft when a save fails
    pub draft_retention: DraftRetention,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_override: String::new(),
            #[allow(clippy::expect_used)]
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            draft_retention: DraftRetention::default(),
        }
    }
}

impl ClientConfig {
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
        let api_override = lookup("MERCADO_API_URL").unwrap_or_default();

        let origin_raw = lookup("MERCADO_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let origin = Url::parse(origin_raw.trim()).map_err(|e| {
            ConfigError::InvalidEnvVar("MERCADO_ORIGIN".to_string(), e.to_string())
        })?;

        let timeout_secs = match lookup("MERCADO_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("MERCADO_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let keep_draft = lookup("MERCADO_KEEP_DRAFT_ON_FAILURE")
            .map(|raw| parse_flag(&raw, "MERCADO_KEEP_DRAFT_ON_FAILURE"))
            .transpose()?
            .unwrap_or(false);
        let draft_retention = if keep_draft {
            DraftRetention::KeepOnFailure
        } else {
            DraftRetention::ClearAlways
        };

        Ok(Self {
            api_override,
            origin,
            request_timeout: Duration::from_secs(timeout_secs),
            draft_retention,
        })
    }

    /// Replace the resolver override (e.g., from a command-line flag).
    #[must_use]
    pub fn with_api_override(mut self, api_override: impl Into<String>) -> Self {
        self.api_override = api_override.into();
        self
    }

    /// Replace the origin used for relative bases.
    #[must_use]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    /// The resolved base address: a loopback URL or the proxy prefix.
    #[must_use]
    pub fn base_address(&self) -> String {
        resolve_base(&self.api_override)
    }

    /// The absolute root every catalog request is built from.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resulting address is not a valid URL.
    pub fn api_root(&self) -> Result<String, ConfigError> {
        let base = self.base_address();
        let root = if base.starts_with('/') {
            join_url(self.origin.as_str(), &base)
        } else {
            base
        };

        Url::parse(&root)
            .map_err(|e| ConfigError::InvalidEnvVar("MERCADO_API_URL".to_string(), e.to_string()))?;
        Ok(root)
    }
}

fn parse_flag(raw: &str, key: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
