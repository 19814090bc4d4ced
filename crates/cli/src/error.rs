//! Command-level errors.

use mercado_client::{ApiError, ClientError, ConfigError, StoreError};
use mercado_core::ValidationError;
use thiserror::Error;

/// Errors that end a command with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The client could not be built.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// The catalog could not be read.
    #[error("Could not load products: {0}")]
    Sync(ApiError),

    /// The form values were rejected before anything was sent.
    #[error("Invalid product: {0}")]
    Invalid(#[from] ValidationError),

    /// A create, update or delete failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The console hit an unrecoverable failure.
    #[error("Console halted: {0}")]
    Fault(String),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
