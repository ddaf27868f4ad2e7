use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Jobs waiting for the worker.
    pub queue_size: usize,
    /// Whether the worker is running a job right now.
    pub is_processing: bool,
}

/// GET /health -- returns service liveness and queue load.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let queue_status = state.queue.queue_status().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        queue_size: queue_status.queue_size,
        is_processing: queue_status.is_processing,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
