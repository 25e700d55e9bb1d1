//! HTTP surface built on axum.
//!
//! Management routes (`/config`, `/endpoints`, `/api-docs`) are registered
//! explicitly; every other request falls through to the mock handler, which
//! resolves it against the scenario config and replays the fixture.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::observability::metrics;
use crate::resolve::{EndpointFilter, Resolution, ResolutionEngine, collect_query};
use crate::store::Fixture;
use crate::store::config::keys_with_multiple_active;
use crate::transport::{cors, openapi};

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to, e.g. `"0.0.0.0:3001"`.
    pub bind_addr: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,
}

/// State shared by all handlers.
#[derive(Debug, Clone)]
struct AppState {
    engine: Arc<ResolutionEngine>,
}

impl AppState {
    /// Runs a storage operation on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, Response>
    where
        T: Send + 'static,
        F: FnOnce(&ResolutionEngine) -> T + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || op(&engine))
            .await
            .map_err(|e| {
                error!(error = %e, "storage task failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            })
    }
}

/// A running HTTP server.
pub struct HttpServer {
    bound_addr: SocketAddr,
    cancel: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

impl HttpServer {
    /// Binds the listener and starts serving in a background task.
    ///
    /// The server stops gracefully when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TCP listener cannot bind.
    pub async fn bind(
        config: HttpConfig,
        engine: ResolutionEngine,
        cancel: CancellationToken,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| TransportError::BindFailed(format!("{}: {e}", config.bind_addr)))?;

        let bound_addr = listener
            .local_addr()
            .map_err(|e| TransportError::BindFailed(format!("local_addr failed: {e}")))?;

        let router = build_router(engine, config.max_body_size);

        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    server_cancel.cancelled().await;
                })
                .await;
            debug!("HTTP server shut down");
            result
        });

        Ok(Self {
            bound_addr,
            cancel,
            handle,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.bound_addr
    }

    /// Requests a graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Waits until the server stops.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Serve`] if the serve loop failed or panicked.
    pub async fn wait(self) -> Result<(), TransportError> {
        match self.handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Serve(e.to_string())),
            Err(e) => Err(TransportError::Serve(format!("server task failed: {e}"))),
        }
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("bound_addr", &self.bound_addr)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Axum Router
// ============================================================================

/// Builds the router: management routes, the mock fallback, CORS and the
/// body size limit.
pub fn build_router(engine: ResolutionEngine, max_body_size: usize) -> Router {
    let state = AppState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/config", get(handle_get_config).post(handle_post_config))
        .route("/endpoints", get(handle_get_endpoints).post(handle_post_endpoints))
        .route("/api-docs", get(handle_api_docs))
        .route("/api-docs/{*rest}", any(handle_api_docs_path))
        .fallback(handle_mock)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(axum::middleware::from_fn(cors::cors))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `GET /config`
async fn handle_get_config(State(state): State<AppState>) -> Response {
    metrics::record_management_request("config");
    match state.blocking(ResolutionEngine::load_config).await {
        Ok(config) => Json(config).into_response(),
        Err(response) => response,
    }
}

/// `POST /config`
///
/// Replaces the config wholesale with the body, which must be a JSON object.
async fn handle_post_config(State(state): State<AppState>, body: Bytes) -> Response {
    metrics::record_management_request("config");

    let Ok(Value::Object(config)) = serde_json::from_slice::<Value>(&body) else {
        return error_response(StatusCode::BAD_REQUEST, "body must be a valid JSON object");
    };

    let multiple = keys_with_multiple_active(&config);
    if !multiple.is_empty() {
        warn!(
            keys = ?multiple,
            "config marks more than one active scenario for some keys; the first listed wins"
        );
    }

    let saved = match state
        .blocking(move |engine| {
            let saved = engine.replace_config(&config);
            (saved, config)
        })
        .await
    {
        Ok(result) => result,
        Err(response) => return response,
    };

    match saved {
        (true, config) => {
            metrics::record_config_write();
            info!(keys = config.len(), "scenario config replaced");
            Json(json!({
                "success": true,
                "message": "config updated",
                "config": config,
            }))
            .into_response()
        }
        (false, _) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save config"),
    }
}

/// `GET /endpoints`
async fn handle_get_endpoints(State(state): State<AppState>) -> Response {
    metrics::record_management_request("endpoints");
    match state.blocking(ResolutionEngine::list_all).await {
        Ok(index) => Json(index).into_response(),
        Err(response) => response,
    }
}

/// `POST /endpoints`
///
/// An empty body means no filter.
async fn handle_post_endpoints(State(state): State<AppState>, body: Bytes) -> Response {
    metrics::record_management_request("endpoints");

    let filter = if body.iter().all(u8::is_ascii_whitespace) {
        EndpointFilter::default()
    } else {
        match serde_json::from_slice::<EndpointFilter>(&body) {
            Ok(filter) => filter,
            Err(e) => {
                debug!(error = %e, "rejecting endpoint filter");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "body must be a JSON object with optional string fields queryKey and useCase",
                );
            }
        }
    };

    match state.blocking(move |engine| engine.query(&filter)).await {
        Ok(index) => Json(index).into_response(),
        Err(response) => response,
    }
}

/// `GET /api-docs`
async fn handle_api_docs() -> Json<Value> {
    metrics::record_management_request("api-docs");
    Json(openapi::document())
}

/// Paths under `/api-docs/`: the document at `openapi.json`, 404 for the
/// rest. Nothing under this prefix is mocked.
async fn handle_api_docs_path(method: Method, Path(rest): Path<String>) -> Response {
    if method == Method::GET && rest == "openapi.json" {
        return handle_api_docs().await.into_response();
    }
    debug!(%rest, "unknown api-docs path");
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// Fallback: every unmatched request is a mocked endpoint.
async fn handle_mock(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            debug!(error = %e, "unparsable query string, resolving without parameters");
            Vec::new()
        }
    };
    let params = collect_query(pairs);
    let path = uri.path().to_owned();
    let method_name = method.as_str().to_owned();

    let started = Instant::now();
    let resolution = {
        let method_name = method_name.clone();
        let path = path.clone();
        match state
            .blocking(move |engine| engine.resolve(&method_name, &path, &params))
            .await
        {
            Ok(resolution) => resolution,
            Err(response) => return response,
        }
    };
    let outcome = resolution.outcome();
    metrics::record_resolution_duration(outcome, started.elapsed());
    metrics::record_request(&method_name, outcome);
    info!(method = %method_name, %path, key = %resolution.key(), outcome, "mock request");

    resolution_response(resolution)
}

/// Converts a resolution into the HTTP response sent to the client.
fn resolution_response(resolution: Resolution) -> Response {
    match resolution {
        Resolution::NotConfigured { key } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "mock not found",
                "queryKey": key,
                "message": format!("no active use case for {key}; check the scenario config"),
            })),
        )
            .into_response(),
        Resolution::FixtureMissing { ref key, ref scenario } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "mock file not found",
                "queryKey": key,
                "useCase": scenario,
                "expectedFile": resolution.expected_file(),
            })),
        )
            .into_response(),
        Resolution::Resolved { fixture, .. } => fixture_response(fixture),
    }
}

/// Headers a fixture may not override: they describe the framing of the
/// recorded connection, not of the response being sent.
const FRAMING_HEADERS: [&str; 7] = [
    "connection",
    "content-length",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Replays a fixture: status, JSON body, then the fixture's headers.
///
/// Fixture headers override the defaults, including `content-type`.
/// Framing headers are dropped.
fn fixture_response(fixture: Fixture) -> Response {
    let status = StatusCode::from_u16(fixture.effective_status()).unwrap_or_else(|_| {
        warn!(status = fixture.effective_status(), "fixture status out of range, sending 200");
        StatusCode::OK
    });

    let mut response = (status, Json(fixture.response)).into_response();
    for (name, value) in fixture.headers.into_iter().flatten() {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), _) if FRAMING_HEADERS.contains(&name.as_str()) => {
                warn!(header = %name, "ignoring framing header from fixture");
            }
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid fixture header"),
        }
    }
    response
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:3001` → `0.0.0.0:3001`
/// - `3001` → `0.0.0.0:3001`
/// - `1.2.3.4:3001` → as-is
///
/// # Errors
///
/// Returns [`TransportError::InvalidBindAddress`] if the result cannot be
/// parsed as a valid socket address.
pub fn parse_bind_addr(input: &str) -> Result<String, TransportError> {
    let addr = if input.starts_with(':') {
        format!("0.0.0.0{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("0.0.0.0:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>()
        .map_err(|e| TransportError::InvalidBindAddress(format!("\"{input}\": {e}")))?;
    Ok(addr)
}

// ============================================================================
// Tests
// ============================================================================
