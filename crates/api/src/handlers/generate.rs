//! Handlers for image generation requests.
//!
//! Both routes share the same query parameters and admission path. The
//! blocking route holds the connection until the job finishes; the async
//! route returns a job id to poll.

use axum::extract::{Query, State};
use axum::Json;
use genqueue_core::error::CoreError;
use genqueue_core::generation::{GenerationParams, DEFAULT_MODEL, DEFAULT_PROMPT, DEFAULT_SEED};
use genqueue_core::job::JobState;
use genqueue_core::types::JobId;
use genqueue_queue::QueueStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::ImageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Query parameters accepted by both generation routes.
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_model")]
    pub model: String,
    pub negative_prompt: Option<String>,
    pub guidance_scale: Option<f64>,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl GenerateQuery {
    fn into_params(self) -> Result<GenerationParams, CoreError> {
        GenerationParams::parse(
            self.prompt,
            self.seed,
            &self.model,
            self.negative_prompt,
            self.guidance_scale,
        )
    }
}

/// Response for GET /generate/img/async.
#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub job_id: JobId,
    pub state: JobState,
    pub message: String,
    pub queue_status: QueueStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /generate/img/priv
///
/// Admit a blocking job and answer with the image once the worker is done.
pub async fn generate_blocking(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> AppResult<ImageResponse> {
    let params = query.into_params()?;
    let ticket = state.queue.submit_blocking(params).await?;
    let job_id = ticket.id;

    let image = ticket
        .wait(state.config.blocking_wait_timeout)
        .await
        .inspect_err(|e| {
            tracing::debug!(%job_id, error = %e, "Blocking job did not produce an image");
        })?;

    Ok(ImageResponse(image))
}

/// GET /generate/img/async
///
/// Admit a polled job and return its id straight away.
pub async fn generate_async(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> AppResult<Json<SubmittedResponse>> {
    let params = query.into_params()?;
    let job_id = state.queue.submit(params).await?;

    Ok(Json(SubmittedResponse {
        job_id,
        state: JobState::Queued,
        message: format!("Job added to queue. Use /status/{job_id} to check progress."),
        queue_status: state.queue.queue_status().await,
    }))
}
