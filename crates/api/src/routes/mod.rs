pub mod generate;
pub mod health;
pub mod jobs;
pub mod queue;

use axum::Router;

use crate::state::AppState;

/// Build the route tree for every endpoint that answers promptly.
///
/// Route hierarchy:
///
/// ```text
/// /generate/img/async          submit a polled job
/// /status/{job_id}             job state and timestamps
/// /result/{job_id}             image bytes once completed
/// /queue/status                queue snapshot
/// /queue/clear                 discard pending jobs and records (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(generate::async_router())
        .merge(jobs::router())
        .nest("/queue", queue::router())
}

/// Routes that hold the connection until a job finishes. Mounted outside
/// the request timeout.
///
/// ```text
/// /generate/img/priv           submit a blocking job
/// ```
pub fn blocking_routes() -> Router<AppState> {
    generate::blocking_router()
}
