//! Errors raised while wiring a client together.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Startup-level client error.
///
/// Runtime failures are reported as outcome values by the store and session;
/// this type only covers getting a client built.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded or resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}
