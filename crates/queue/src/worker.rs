//! The single generation worker.
//!
//! One long-lived Tokio task drains the admission queue in FIFO order and
//! runs exactly one backend call at a time, which matches the backend's
//! own concurrency limit. Job failures are recorded on the job; faults in
//! the loop itself trigger an exponential backoff. The loop only exits
//! when its cancellation token fires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use genqueue_backend::{generate_first, GenerationBackend};
use genqueue_core::error::CoreError;
use genqueue_core::types::JobId;
use tokio_util::sync::CancellationToken;

use crate::admission::QueuedJob;
use crate::config::{next_delay, BackoffConfig};
use crate::{JobOutcome, JobQueue};

/// Faults in the worker's own control flow, as opposed to job failures.
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    /// The spawned generation task panicked or was aborted.
    #[error("generation task aborted: {0}")]
    TaskAborted(#[from] tokio::task::JoinError),
}

/// Background generation worker.
pub struct Worker {
    queue: Arc<JobQueue>,
    backend: Arc<dyn GenerationBackend>,
    backoff: BackoffConfig,
}

impl Worker {
    /// Create a worker using the queue's configured backoff.
    pub fn new(queue: Arc<JobQueue>, backend: Arc<dyn GenerationBackend>) -> Self {
        let backoff = queue.config().worker_backoff.clone();
        Self {
            queue,
            backend,
            backoff,
        }
    }

    /// Run the worker loop until the cancellation token is triggered.
    ///
    /// Cancellation is only observed between jobs; a running generation is
    /// never interrupted.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!("Generation worker started");
        let mut delay = self.backoff.initial_delay;

        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Generation worker shutting down");
                    break;
                }
                job = self.queue.next_job() => job,
            };

            match self.process(job).await {
                Ok(()) => delay = self.backoff.initial_delay,
                Err(fault) => {
                    tracing::error!(
                        error = %fault,
                        delay_ms = delay.as_millis() as u64,
                        "Worker fault, backing off",
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Generation worker shutting down");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay = next_delay(delay, &self.backoff);
                }
            }
        }
    }

    /// Run one job to completion and record its outcome.
    async fn process(&self, job: QueuedJob) -> Result<(), WorkerFault> {
        let QueuedJob { id, params, waiter } = job;

        tracing::info!(job_id = %id, model = %params.model, "Generation started");

        let started = Instant::now();
        let backend = Arc::clone(&self.backend);
        let handle =
            tokio::spawn(async move { generate_first(backend.as_ref(), &params).await });

        let (outcome, fault): (JobOutcome, Option<WorkerFault>) = match handle.await {
            Ok(Ok(image)) => (Ok(Arc::from(image.bytes)), None),
            Ok(Err(e)) => (Err(CoreError::Generation(e.to_string())), None),
            Err(join_err) => (
                Err(CoreError::Generation(format!(
                    "Image generation failed: {join_err}"
                ))),
                Some(WorkerFault::from(join_err)),
            ),
        };

        log_outcome(id, &outcome, started.elapsed());
        self.queue.finish(id, outcome, waiter).await;

        fault.map_or(Ok(()), Err)
    }
}

fn log_outcome(id: JobId, outcome: &JobOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        Ok(image) => tracing::info!(
            job_id = %id,
            elapsed_ms,
            image_bytes = image.len(),
            "Generation completed",
        ),
        Err(e) => tracing::warn!(
            job_id = %id,
            elapsed_ms,
            error = %e,
            "Generation failed",
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
