//! Integration tests for Mercado.
//!
//! Everything runs in-process: [`FakeCatalog`] stands in for the remote
//! catalog service (text prices, trailing-slash routes, newest first, mounted
//! under `/api`) and [`start_proxy`] runs the real proxy router in front of it.
//! Both bind ephemeral loopback ports, so tests can run in parallel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercado-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use mercado_client::{ClientConfig, DraftRetention, HttpProductApi};
use mercado_proxy::ProxyState;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

const TIMESTAMP: &str = "2025-01-01T12:00:00.000000-03:00";

/// A product as the catalog service stores and serializes it.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: i64,
    pub nome: String,
    /// Decimal rendered as text with two places.
    pub preco: String,
    pub estoque: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// What the catalog saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub host: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
struct CatalogState {
    records: Vec<Record>,
    next_id: i64,
    fail_next: bool,
    seen: Vec<SeenRequest>,
}

/// In-process fake of the remote catalog service.
#[derive(Clone)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
    addr: SocketAddr,
}

impl FakeCatalog {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(CatalogState {
            next_id: 1,
            ..CatalogState::default()
        }));

        let api = Router::new()
            .route("/produtos/", get(list).post(create))
            .route("/produtos/{id}/", put(update).delete(remove));
        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), observe))
            .with_state(Arc::clone(&state));

        let addr = serve(app).await;
        Self { state, addr }
    }

    /// Base address including the `/api` prefix.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Insert a record directly, as if another operator had created it.
    pub fn seed(&self, nome: &str, preco: &str, estoque: i64) -> i64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.records.insert(
            0,
            Record {
                id,
                nome: nome.to_string(),
                preco: preco.to_string(),
                estoque,
                created_at: TIMESTAMP.to_string(),
                updated_at: TIMESTAMP.to_string(),
            },
        );
        id
    }

    /// Make the next request fail with `503`.
    pub fn fail_next(&self) {
        self.lock().fail_next = true;
    }

    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    #[must_use]
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.lock().seen.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().expect("catalog state poisoned")
    }
}

type Shared = Arc<Mutex<CatalogState>>;

fn lock(state: &Shared) -> MutexGuard<'_, CatalogState> {
    state.lock().expect("catalog state poisoned")
}

impl SeenRequest {
    fn of(request: &Request) -> Self {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            host: header("host"),
            request_id: header("x-request-id"),
        }
    }
}

async fn observe(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let seen = SeenRequest::of(&request);

    let fail = {
        let mut state = lock(&state);
        state.seen.push(seen);
        std::mem::take(&mut state.fail_next)
    };
    if fail {
        return (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response();
    }
    next.run(request).await
}

async fn list(State(state): State<Shared>) -> Json<Vec<Record>> {
    Json(lock(&state).records.clone())
}

/// Validate a `{nome, preco, estoque}` body; `preco` may be a number or text.
fn parse_body(body: &Value) -> Result<(String, String, i64), Response> {
    let invalid = |field: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ field: ["A valid value is required."] })),
        )
            .into_response()
    };

    let nome = body
        .get("nome")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| invalid("nome"))?;
    let preco = match body.get("preco") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite() && *p >= 0.0)
    .ok_or_else(|| invalid("preco"))?;
    let estoque = body
        .get("estoque")
        .and_then(Value::as_i64)
        .filter(|e| *e >= 0)
        .ok_or_else(|| invalid("estoque"))?;

    Ok((nome.to_string(), format!("{preco:.2}"), estoque))
}

async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let (nome, preco, estoque) = match parse_body(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut state = lock(&state);
    let id = state.next_id;
    state.next_id += 1;
    let record = Record {
        id,
        nome,
        preco,
        estoque,
        created_at: TIMESTAMP.to_string(),
        updated_at: TIMESTAMP.to_string(),
    };
    state.records.insert(0, record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let (nome, preco, estoque) = match parse_body(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut state = lock(&state);
    let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
        return not_found();
    };
    record.nome = nome;
    record.preco = preco;
    record.estoque = estoque;
    Json(record.clone()).into_response()
}

async fn remove(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let before = state.records.len();
    state.records.retain(|r| r.id != id);
    if state.records.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Not found." })),
    )
        .into_response()
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    addr
}

/// Run the real proxy router in front of `upstream`; returns its origin.
pub async fn start_proxy(upstream: &str) -> Url {
    let state = ProxyState::new(upstream, Duration::from_secs(5)).expect("Failed to build proxy");
    let addr = serve(mercado_proxy::router(state, None)).await;
    Url::parse(&format!("http://{addr}")).expect("Proxy origin is a valid URL")
}

/// Client configuration for an override, resolved against `origin`.
#[must_use]
pub fn client_config(api_override: &str, origin: Url) -> ClientConfig {
    ClientConfig {
        api_override: api_override.to_string(),
        origin,
        request_timeout: Duration::from_secs(5),
        draft_retention: DraftRetention::ClearAlways,
    }
}

/// Build the real HTTP client for a configuration.
#[must_use]
pub fn http_api(config: &ClientConfig) -> HttpProductApi {
    HttpProductApi::from_config(config).expect("Failed to build HTTP client")
}
