//! `/api` prefix forwarding.
//!
//! `{method} /api{rest}?{query}` becomes `{method} {upstream}{rest}?{query}`.
//! The upstream's own host is used (the incoming `Host` header is dropped) and
//! hop-by-hop headers are not forwarded in either direction.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::Response;
use mercado_core::{PROXY_PREFIX, join_url};
use tracing::{debug, instrument};

use crate::error::ProxyError;
use crate::state::ProxyState;

/// Largest request body accepted for forwarding.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Headers that describe one connection rather than the message.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Path below the proxy prefix; `/api` alone maps to `/`.
#[must_use]
pub fn strip_prefix(path: &str) -> &str {
    match path.strip_prefix(PROXY_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Upstream address for an incoming path and query.
#[must_use]
pub fn upstream_url(upstream: &str, path: &str, query: Option<&str>) -> String {
    let mut target = join_url(upstream, strip_prefix(path));
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Copy `headers`, leaving out hop-by-hop headers and those named in
/// `Connection`, plus anything the HTTP client recomputes.
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    headers
        .iter()
        .filter(|&(name, _)| {
            !HOP_BY_HOP.contains(name)
                && !listed.contains(name)
                && *name != header::HOST
                && *name != header::CONTENT_LENGTH
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Forward one request to the upstream and relay its response.
///
/// # Errors
///
/// Returns `ProxyError` if the body cannot be read or the upstream fails.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn forward(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let target = upstream_url(state.upstream(), parts.uri.path(), parts.uri.query());
    let body = to_bytes(body, MAX_BODY_BYTES).await?;

    debug!(%target, "Forwarding request");
    let upstream = state
        .client()
        .request(parts.method, &target)
        .headers(end_to_end(&parts.headers))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = end_to_end(upstream.headers());
    let bytes = upstream.bytes().await?;
    debug!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_prefix_is_stripped() {
        assert_eq!(strip_prefix("/api/produtos/"), "/produtos/");
        assert_eq!(strip_prefix("/api"), "/");
        assert_eq!(strip_prefix("/api/"), "/");
        assert_eq!(strip_prefix("/apiary"), "/apiary");
    }

    #[test]
    fn test_upstream_url_keeps_target_prefix_and_query() {
        assert_eq!(
            upstream_url("http://localhost:8000/api", "/api/produtos/3/", None),
            "http://localhost:8000/api/produtos/3/"
        );
        assert_eq!(
            upstream_url("http://backend:8000", "/api/produtos/", Some("page=2")),
            "http://backend:8000/produtos/?page=2"
        );
    }

    #[test]
    fn test_hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("127.0.0.1:5173"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-request-id", HeaderValue::from_static("abc"));

        let forwarded = end_to_end(&headers);
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[header::CONTENT_TYPE], "application/json");
        assert_eq!(forwarded["x-request-id"], "abc");
    }
}
