//! Handlers for queue inspection and administration.

use axum::extract::State;
use axum::Json;
use genqueue_queue::QueueStatus;
use serde::Serialize;

use crate::state::AppState;

/// Response for DELETE /queue/clear.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: &'static str,
    pub cleared_requests: usize,
}

/// GET /queue/status
pub async fn get_queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.queue.queue_status().await)
}

/// DELETE /queue/clear
///
/// Drops every pending job and every stored record. A job already running
/// is left to finish.
pub async fn clear_queue(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared_requests = state.queue.clear().await;
    Json(ClearResponse {
        message: "Queue cleared",
        cleared_requests,
    })
}
