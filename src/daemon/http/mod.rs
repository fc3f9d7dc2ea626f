//! HTTP API server.
//!
//! ## Endpoints
//!
//! ### Sessions
//! - `POST /sessions` - Create a completed session from media URLs
//! - `POST /sessions/reserve` - Create an empty session in `PROCESSING`
//! - `GET /sessions/{code}` - Fetch a session (404 unknown, 410 expired)
//! - `PATCH /sessions/{code}` - Attach media to a processing session
//!
//! ### Coupons
//! - `POST /coupons` - Create a coupon (admin)
//! - `GET /coupons/{code}` - Fetch a coupon
//! - `PATCH /coupons/{code}` - Enable or disable a coupon (admin)
//! - `POST /coupons/{code}/validate` - Price an amount without consuming a use
//! - `POST /coupons/{code}/redeem` - Consume one use and price an amount
//!
//! ### Maintenance (admin)
//! - `POST /maintenance/sweep` - Evict expired sessions now
//! - `GET /maintenance/stats` - Session and coupon counters
//!
//! ### System
//! - `GET /health` - Health check
//! - `GET /version` - Version info
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Authentication
//!
//! Admin routes are protected when `SNAPBOOTH_API_KEY` is set: requests
//! must carry a matching `X-API-Key` header. Session reads and coupon
//! validation/redemption stay public so booth kiosks and share pages work
//! without credentials.
//!
//! ```bash
//! export SNAPBOOTH_API_KEY="your-secret-key"
//! snapbooth serve
//!
//! curl -X POST -H "X-API-Key: your-secret-key" http://localhost:8080/maintenance/sweep
//! ```

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, MatchedPath, Request, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::constants::{API_KEY_ENV, API_KEY_HEADER, MAX_BODY_SIZE_BYTES};
use crate::daemon::config::Config;
use crate::daemon::error::Error;
use crate::daemon::logging::{generate_request_id, log_request_complete};
use crate::daemon::metrics;
use crate::daemon::services::{self, coupons::CouponStore};
use crate::daemon::services::sessions::SessionStore;
use crate::daemon::sweeper;

pub mod handlers;
pub mod types;

pub use types::*;

use handlers::{
    // Coupons
    coupon_create,
    coupon_get,
    coupon_redeem,
    coupon_update,
    coupon_validate,
    // System
    health,
    // Maintenance
    maintenance_stats,
    maintenance_sweep,
    // Sessions
    session_attach,
    session_create,
    session_get,
    session_reserve,
    version,
};

// =============================================================================
// App State
// =============================================================================

/// Shared application state for HTTP handlers.
pub struct AppState {
    pub(crate) sessions: SessionStore,
    pub(crate) coupons: CouponStore,
    /// Base for share links, without trailing slash
    pub(crate) public_url: Option<String>,
    /// Required on admin routes when set
    pub(crate) api_key: Option<String>,
}

impl AppState {
    pub fn new(sessions: SessionStore, coupons: CouponStore) -> Self {
        Self {
            sessions,
            coupons,
            public_url: None,
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url.map(|url| url.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }
}

pub(crate) type SharedState = Arc<AppState>;

// =============================================================================
// HTTP API Server
// =============================================================================

/// Builds the API router with all middleware layers.
pub fn router(state: AppState) -> Router {
    let state: SharedState = Arc::new(state);

    Router::new()
        // Sessions
        .route("/sessions", post(session_create))
        .route("/sessions/reserve", post(session_reserve))
        .route("/sessions/{code}", get(session_get).patch(session_attach))
        // Coupons
        .route("/coupons", post(coupon_create))
        .route("/coupons/{code}", get(coupon_get).patch(coupon_update))
        .route("/coupons/{code}/validate", post(coupon_validate))
        .route("/coupons/{code}/redeem", post(coupon_redeem))
        // Maintenance
        .route("/maintenance/sweep", post(maintenance_sweep))
        .route("/maintenance/stats", get(maintenance_stats))
        // Observability
        .route("/metrics", get(metrics_endpoint))
        // System endpoints
        .route("/health", get(health))
        .route("/version", get(version))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            api_key_auth_middleware,
        ))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE_BYTES))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
}

/// Opens the stores under the configured data directory and serves the API
/// until SIGINT or SIGTERM. The sweeper runs alongside when enabled.
pub async fn serve(config: Config) -> Result<()> {
    let data_dir = config.data_dir().context("Failed to get data directory")?;

    metrics::init_metrics()?;
    tracing::info!("Prometheus metrics initialized");

    let sessions = services::open_sessions(&data_dir)?;
    let coupons = services::open_coupons(&data_dir)?;

    let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    if api_key.is_some() {
        tracing::info!("API key authentication enabled ({API_KEY_ENV} is set)");
    } else {
        tracing::warn!("API key authentication disabled ({API_KEY_ENV} not set)");
    }

    let state = AppState::new(sessions.clone(), coupons)
        .with_public_url(config.public_url())
        .with_api_key(api_key);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let sweeper_task = if config.sweeper.enabled {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let interval = config.sweeper.interval();
        let handle = tokio::spawn(sweeper::run(sessions, interval, rx));
        Some((tx, handle))
    } else {
        tracing::info!("Sweeper disabled by configuration");
        None
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(
        %addr,
        data_dir = %data_dir.display(),
        "snapbooth listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some((tx, handle)) = sweeper_task {
        let _ = tx.send(());
        let _ = handle.await;
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server...");
}

// =============================================================================
// Middleware
// =============================================================================

/// Whether a route needs the API key: maintenance, coupon creation and
/// coupon updates.
fn requires_api_key(method: &Method, path: &str) -> bool {
    if path.starts_with("/maintenance/") {
        return true;
    }
    if path == "/coupons" {
        return method == Method::POST;
    }
    if let Some(rest) = path.strip_prefix("/coupons/")
        && !rest.contains('/')
    {
        return method == Method::PATCH;
    }
    false
}

/// Middleware for API key authentication on admin routes.
///
/// If no key is configured, all requests pass through.
async fn api_key_auth_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_key) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    if !requires_api_key(request.method(), path) {
        return next.run(request).await;
    }

    let provided_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided_key {
        Some(key) if key == expected_key => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %path, "API key authentication failed: invalid key");
            AppError::Unauthorized("Invalid API key".to_string()).into_response()
        },
        None => {
            tracing::warn!(path = %path, "API key authentication failed: missing header");
            AppError::Unauthorized(format!("Missing {API_KEY_HEADER} header")).into_response()
        },
    }
}

/// Middleware to record HTTP request metrics.
async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    // Label by route template, never the raw path
    let route = metrics::route_label(
        request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
    )
    .to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    metrics::record_http_request(&method, &route, status, duration);

    response
}

/// Middleware assigning a request id, running the request inside a span and
/// logging its completion. The id is echoed in `X-Request-Id`.
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = generate_request_id();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let span = crate::request_span!(request_id, method, path);
    let mut response = next.run(request).instrument(span).await;

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    log_request_complete(
        &request_id,
        &method,
        &path,
        response.status().as_u16(),
        duration_ms,
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

// =============================================================================
// Metrics Handler
// =============================================================================

/// GET /metrics - Prometheus metrics endpoint.
async fn metrics_endpoint() -> impl IntoResponse {
    let body = metrics::render_metrics();
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

// =============================================================================
// Error Handling
// =============================================================================

/// Application error types for HTTP responses.
#[derive(Debug)]
pub(crate) enum AppError {
    NotFound(String),
    Gone(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    PayloadTooLarge(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Gone(msg) => (StatusCode::GONE, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "Request failed with internal error");
        }

        let message = err.client_message();
        match err.status_code() {
            400 => Self::BadRequest(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            410 => Self::Gone(message),
            422 => Self::Unprocessable(message),
            _ => Self::Internal(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::from(Error::Internal(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge(rejection.body_text());
        }
        Self::BadRequest(rejection.body_text())
    }
}
