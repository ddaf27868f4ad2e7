//! The job queue service: admission, status queries, and the hooks the
//! worker and reaper drive.
//!
//! Created once at startup and shared as `Arc<JobQueue>`. Lock order is
//! always admission queue first, job store second.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use genqueue_core::error::CoreError;
use genqueue_core::generation::GenerationParams;
use genqueue_core::job::{JobMode, JobState};
use genqueue_core::types::{new_job_id, JobId, Timestamp};
use serde::Serialize;
use tokio::sync::{oneshot, Mutex, Notify};

use crate::admission::{AdmissionQueue, QueuedJob};
use crate::config::QueueConfig;
use crate::store::{JobPhase, JobRecord, JobStore, JobSummary};
use crate::JobOutcome;

/// Point-in-time view of the queue and worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub queue_size: usize,
    pub max_queue_size: usize,
    pub is_processing: bool,
    pub current_job_id: Option<JobId>,
}

/// Handle returned to a blocking caller after admission.
///
/// Owns the receiving half of the job's result channel; the worker holds
/// the sending half.
#[derive(Debug)]
pub struct BlockingTicket {
    pub id: JobId,
    receiver: oneshot::Receiver<JobOutcome>,
}

impl BlockingTicket {
    /// Wait for the worker to report the outcome.
    ///
    /// With `timeout = None` the wait is unbounded. A timeout does not stop
    /// the job; it only releases the caller.
    pub async fn wait(self, timeout: Option<Duration>) -> JobOutcome {
        let id = self.id;
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.receiver).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(CoreError::Timeout {
                        id,
                        waited_secs: limit.as_secs(),
                    })
                }
            },
            None => self.receiver.await,
        };

        received.unwrap_or_else(|_| {
            Err(CoreError::Cancelled(format!(
                "Job {id} was discarded before it finished"
            )))
        })
    }
}

/// Bounded, single-worker job queue with an in-memory job store.
pub struct JobQueue {
    config: QueueConfig,
    admission: Mutex<AdmissionQueue>,
    store: JobStore,
    job_available: Notify,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> Arc<Self> {
        Arc::new(Self {
            admission: Mutex::new(AdmissionQueue::new(config.max_queue_size)),
            store: JobStore::new(),
            job_available: Notify::new(),
            config,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    // -- Admission --------------------------------------------------------

    /// Admit a polled job. Returns its id immediately.
    pub async fn submit(&self, params: GenerationParams) -> Result<JobId, CoreError> {
        self.admit(params, None).await
    }

    /// Admit a blocking job. The caller awaits the returned ticket.
    pub async fn submit_blocking(
        &self,
        params: GenerationParams,
    ) -> Result<BlockingTicket, CoreError> {
        let (sender, receiver) = oneshot::channel();
        let id = self.admit(params, Some(sender)).await?;
        Ok(BlockingTicket { id, receiver })
    }

    async fn admit(
        &self,
        params: GenerationParams,
        waiter: Option<oneshot::Sender<JobOutcome>>,
    ) -> Result<JobId, CoreError> {
        params.validate()?;

        let id = new_job_id();
        let mode = if waiter.is_some() {
            JobMode::Blocking
        } else {
            JobMode::Polled
        };

        let queue_size = {
            let mut admission = self.admission.lock().await;
            if admission.is_full() {
                tracing::warn!(
                    capacity = admission.capacity(),
                    "Rejected job: admission queue is full",
                );
                return Err(CoreError::QueueFull {
                    capacity: admission.capacity(),
                });
            }

            self.store
                .insert(JobRecord::queued(id, params.clone(), mode, Utc::now()))
                .await?;
            admission.try_push(QueuedJob { id, params, waiter })?;
            admission.len()
        };

        self.job_available.notify_one();
        tracing::info!(job_id = %id, ?mode, queue_size, "Job admitted");
        Ok(id)
    }

    // -- Accessors ---------------------------------------------------------

    pub async fn queue_status(&self) -> QueueStatus {
        let admission = self.admission.lock().await;
        QueueStatus {
            queue_size: admission.len(),
            max_queue_size: admission.capacity(),
            is_processing: admission.current().is_some(),
            current_job_id: admission.current(),
        }
    }

    /// Number of jobs waiting for the worker.
    pub async fn size(&self) -> usize {
        self.admission.lock().await.len()
    }

    pub async fn is_full(&self) -> bool {
        self.admission.lock().await.is_full()
    }

    pub async fn job_status(&self, id: JobId) -> Result<JobState, CoreError> {
        Ok(self.store.get(id).await?.state())
    }

    pub async fn job_summary(&self, id: JobId) -> Result<JobSummary, CoreError> {
        Ok(self.store.get(id).await?.summary())
    }

    /// The image for a completed job.
    ///
    /// Queued or processing jobs report [`CoreError::NotReady`]; failed jobs
    /// report their stored error as [`CoreError::Generation`].
    pub async fn job_result(&self, id: JobId) -> Result<Arc<[u8]>, CoreError> {
        let record = self.store.get(id).await?;
        match record.phase {
            JobPhase::Completed(image) => Ok(image),
            JobPhase::Failed(error) => Err(CoreError::Generation(error)),
            phase @ (JobPhase::Queued | JobPhase::Processing) => Err(CoreError::NotReady {
                id,
                state: phase.state(),
            }),
        }
    }

    /// All job summaries, oldest first.
    pub async fn jobs(&self) -> Vec<JobSummary> {
        self.store
            .snapshot()
            .await
            .iter()
            .map(JobRecord::summary)
            .collect()
    }

    // -- Administration ----------------------------------------------------

    /// Discard every pending job and every stored record.
    ///
    /// Blocking callers of discarded jobs are released with
    /// [`CoreError::Cancelled`]. A job already running keeps running; its
    /// caller (if blocking) still receives the outcome. Returns the number
    /// of pending jobs discarded.
    pub async fn clear(&self) -> usize {
        let (drained, evicted) = {
            let mut admission = self.admission.lock().await;
            let drained = admission.drain_pending();
            let evicted = self.store.clear().await;
            (drained, evicted)
        };

        let cleared = drained.len();
        for job in drained {
            if let Some(waiter) = job.waiter {
                let _ = waiter.send(Err(CoreError::Cancelled(format!(
                    "Job {} was discarded by a queue reset",
                    job.id
                ))));
            }
        }

        tracing::info!(cleared, evicted, "Queue cleared");
        cleared
    }

    /// Evict records submitted before `now - retention`.
    pub async fn reap(&self, now: Timestamp) -> usize {
        let retention = chrono::Duration::from_std(self.config.retention)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        match now.checked_sub_signed(retention) {
            Some(cutoff) => self.store.evict_older_than(cutoff).await,
            None => 0,
        }
    }

    // -- Worker hooks ------------------------------------------------------

    /// Wait for the next pending job, mark it as current, and move its
    /// record to `Processing`.
    ///
    /// Both happen under the admission lock, so no reader sees the marker
    /// set while the record still says `Queued`. Dropping the future after a
    /// job is taken abandons that job; the worker only does so at shutdown.
    pub async fn next_job(&self) -> QueuedJob {
        loop {
            {
                let mut admission = self.admission.lock().await;
                if let Some(job) = admission.pop_for_processing() {
                    let now = Utc::now();
                    let started = self.store.update(job.id, |r| r.begin_processing(now)).await;
                    if let Err(e) = started {
                        // Evicted after admission. The work still runs so a
                        // blocking caller gets its answer.
                        tracing::debug!(job_id = %job.id, error = %e, "Job record missing at start");
                    }
                    return job;
                }
            }
            self.job_available.notified().await;
        }
    }

    /// Record the outcome of `id`, release the current marker, and signal
    /// the blocking caller if there is one.
    pub async fn finish(
        &self,
        id: JobId,
        outcome: JobOutcome,
        waiter: Option<oneshot::Sender<JobOutcome>>,
    ) {
        let now = Utc::now();
        let stored = match &outcome {
            Ok(image) => {
                let image = Arc::clone(image);
                self.store.update(id, |r| r.complete(image, now)).await
            }
            Err(e) => {
                let message = failure_message(e);
                self.store.update(id, |r| r.fail(message, now)).await
            }
        };
        if let Err(e) = stored {
            tracing::debug!(job_id = %id, error = %e, "Job outcome not stored");
        }

        self.admission.lock().await.finish_processing(id);

        if let Some(waiter) = waiter {
            if waiter.send(outcome).is_err() {
                tracing::debug!(job_id = %id, "Blocking caller went away before completion");
            }
        }
    }
}

/// Text stored on a failed job: the backend's message without the
/// taxonomy prefix.
fn failure_message(error: &CoreError) -> String {
    match error {
        CoreError::Generation(msg) => msg.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
