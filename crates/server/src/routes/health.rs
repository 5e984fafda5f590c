//! Service banner and health checks.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// Service banner.
///
/// # Route
///
/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({ "ok": true, "service": "moonbox-backend" }))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the storage backend is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.gateway().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(backend = state.gateway().backend(), error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
