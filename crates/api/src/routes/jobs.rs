use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// ```text
/// GET /status/{job_id} -> get_status
/// GET /result/{job_id} -> get_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status/{job_id}", get(jobs::get_status))
        .route("/result/{job_id}", get(jobs::get_result))
}
