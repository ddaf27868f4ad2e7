//! Handlers for polling individual jobs.

use axum::extract::{Path, State};
use axum::Json;
use genqueue_core::types::JobId;
use genqueue_queue::{JobSummary, QueueStatus};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::ImageResponse;
use crate::state::AppState;

/// Response for GET /status/{job_id}.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub job: JobSummary,
    pub queue_status: QueueStatus,
}

/// Any id that is not a UUID cannot exist, so it is reported as not found.
fn parse_job_id(raw: &str) -> AppResult<JobId> {
    raw.parse().map_err(|_| AppError::UnknownJob(raw.to_string()))
}

/// GET /status/{job_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<JobStatusResponse>> {
    let id = parse_job_id(&job_id)?;
    let job = state.queue.job_summary(id).await?;

    Ok(Json(JobStatusResponse {
        job,
        queue_status: state.queue.queue_status().await,
    }))
}

/// GET /result/{job_id}
///
/// 200 with the image once completed; pending and failed jobs come back
/// through the error mapping as 202 and 500.
pub async fn get_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<ImageResponse> {
    let id = parse_job_id(&job_id)?;
    let image = state.queue.job_result(id).await?;
    Ok(ImageResponse(image))
}
