use axum::routing::get;
use axum::Router;

use crate::handlers::generate;
use crate::state::AppState;

/// ```text
/// GET /generate/img/async -> generate_async
/// ```
pub fn async_router() -> Router<AppState> {
    Router::new().route("/generate/img/async", get(generate::generate_async))
}

/// ```text
/// GET /generate/img/priv -> generate_blocking
/// ```
pub fn blocking_router() -> Router<AppState> {
    Router::new().route("/generate/img/priv", get(generate::generate_blocking))
}
