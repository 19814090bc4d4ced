//! Proxy error handling with Sentry integration.
//!
//! Every forwarding failure is answered with `502 Bad Gateway`; the caller
//! treats it like any other transport failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Forwarding failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream could not be reached or its response could not be read.
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The incoming request body could not be read.
    #[error("Request body error: {0}")]
    Body(#[from] axum::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Proxy error"
        );

        let status = match &self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Body(_) => StatusCode::BAD_REQUEST,
        };

        (status, status.canonical_reason().unwrap_or("Error")).into_response()
    }
}
