//! Mercado development proxy.
//!
//! Serves the operator-facing origin: everything under `/api` is forwarded to
//! the catalog service with the prefix stripped, `/health` answers `ok`, and
//! any other path is served from an optional static directory.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{any, get};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub mod config;
pub mod error;
pub mod forward;
pub mod request_id;
pub mod state;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use state::ProxyState;

/// Build the proxy router.
pub fn router(state: ProxyState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api", any(forward::forward))
        .route("/api/{*rest}", any(forward::forward))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    };

    router
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the upstream.
async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
