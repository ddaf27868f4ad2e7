use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::queue;
use crate::state::AppState;

/// Routes mounted at `/queue`.
///
/// ```text
/// GET    /status -> get_queue_status
/// DELETE /clear  -> clear_queue
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(queue::get_queue_status))
        .route("/clear", delete(queue::clear_queue))
}
