//! System handlers.

use axum::Json;

use super::super::types::{HealthResponse, VersionResponse};

/// GET /health - Liveness check.
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /version - Version info.
pub(crate) async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
