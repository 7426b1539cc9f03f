//! Health endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: 503 when the catalog store does not answer a ping.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog().is_available().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
