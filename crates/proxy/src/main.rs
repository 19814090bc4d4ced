//! Mercado Proxy - development origin for the operator console.
//!
//! Forwards `/api/*` to the catalog service so clients can use the relative
//! `/api` base regardless of where the service actually runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use mercado_proxy::{ProxyConfig, ProxyState, router};
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = ProxyConfig::from_env().expect("Failed to load proxy configuration");

    // Sentry must be up before the subscriber so the tracing layer has a hub.
    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| start_sentry(dsn, &config));
    init_tracing();
    if sentry_guard.is_some() {
        tracing::info!("Sentry error tracking enabled");
    }

    let state = ProxyState::from_config(&config).expect("Failed to build upstream client");
    let app = router(state, config.static_dir.as_deref())
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    tracing::info!(
        %addr,
        upstream = %config.upstream,
        static_dir = ?config.static_dir,
        "Proxy ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(stopped())
        .await
        .expect("Proxy server error");

    drop(sentry_guard);
}

fn start_sentry(dsn: &str, config: &ProxyConfig) -> sentry::ClientInitGuard {
    sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ))
}

/// Text logs by default, flattened JSON when `LOG_FORMAT=json`. Warnings and
/// errors become Sentry events; info and debug become breadcrumbs.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mercado_proxy=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_layer)
        .init();
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn stopped() {
    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }

    tracing::info!("Stopping proxy, draining open requests");
}
