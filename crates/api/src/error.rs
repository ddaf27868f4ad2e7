use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use genqueue_core::error::CoreError;
use genqueue_core::job::JobState;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `genqueue_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A path segment that cannot name any job.
    #[error("Job {0} not found")]
    UnknownJob(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::QueueFull { .. } => {
                    (StatusCode::LOCKED, "QUEUE_FULL", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Generation(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    core.to_string(),
                ),
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} {id} not found"),
                ),
                CoreError::NotReady { state, .. } => (
                    StatusCode::ACCEPTED,
                    "NOT_READY",
                    match state {
                        JobState::Processing => "Job is being processed".to_string(),
                        _ => "Job is still in queue".to_string(),
                    },
                ),
                CoreError::Cancelled(msg) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED", msg.clone())
                }
                CoreError::Timeout { id, .. } => {
                    let body = json!({
                        "error": core.to_string(),
                        "code": "TIMEOUT",
                        "job_id": id,
                    });
                    return (StatusCode::GATEWAY_TIMEOUT, axum::Json(body)).into_response();
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::UnknownJob(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
