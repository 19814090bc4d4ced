//! Base address resolution for the catalog service.
//!
//! Deployments configure one override string. Container-internal hostnames
//! (e.g. `http://backend:8000/api`) are reachable from a co-located proxy but
//! not from the operator's machine, so anything that is not a loopback URL
//! is routed through the same-origin [`PROXY_PREFIX`] instead.

/// Relative path forwarded to the catalog service by the development proxy.
pub const PROXY_PREFIX: &str = "/api";

/// Loopback prefixes reachable directly from the operator's machine.
const DIRECT_PREFIXES: &[&str] = &["http://localhost", "http://127.0.0.1"];

/// Resolve the base address from the configured override.
///
/// The override is trimmed and stripped of trailing slashes. A loopback URL
/// is returned as-is; anything else (including an empty override) yields
/// [`PROXY_PREFIX`].
///
/// ```rust
/// use mercado_core::resolve_base;
///
/// assert_eq!(resolve_base("http://localhost:9000/"), "http://localhost:9000");
/// assert_eq!(resolve_base("http://backend:8000/api/"), "/api");
/// assert_eq!(resolve_base(""), "/api");
/// ```
#[must_use]
pub fn resolve_base(override_url: &str) -> String {
    let trimmed = override_url.trim().trim_end_matches('/');

    if !trimmed.is_empty() && DIRECT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        trimmed.to_owned()
    } else {
        PROXY_PREFIX.to_owned()
    }
}

/// Join a base and a path with exactly one slash between them.
///
/// ```rust
/// use mercado_core::join_url;
///
/// assert_eq!(join_url("/api", "produtos/"), "/api/produtos/");
/// assert_eq!(join_url("/api/", "/produtos/"), "/api/produtos/");
/// ```
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_override_is_used_directly() {
        assert_eq!(resolve_base("http://localhost:9000/"), "http://localhost:9000");
        assert_eq!(resolve_base("  http://127.0.0.1:8000/api// "), "http://127.0.0.1:8000/api");
        assert_eq!(resolve_base("http://localhost"), "http://localhost");
    }

    #[test]
    fn test_other_hosts_go_through_proxy() {
        assert_eq!(resolve_base("http://backend:8000/api/"), "/api");
        assert_eq!(resolve_base("https://localhost:9000"), "/api");
        assert_eq!(resolve_base("api.example.com"), "/api");
    }

    #[test]
    fn test_empty_override_goes_through_proxy() {
        assert_eq!(resolve_base(""), "/api");
        assert_eq!(resolve_base("   "), "/api");
        assert_eq!(resolve_base("///"), "/api");
    }

    #[test]
    fn test_join_url_single_separator() {
        assert_eq!(join_url("/api", "produtos/"), "/api/produtos/");
        assert_eq!(join_url("/api/", "/produtos/"), "/api/produtos/");
        assert_eq!(join_url("/api//", "//produtos/7/"), "/api/produtos/7/");
        assert_eq!(
            join_url("http://localhost:9000", "produtos/"),
            "http://localhost:9000/produtos/"
        );
    }
}
