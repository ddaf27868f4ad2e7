use crate::job::JobState;
use crate::types::JobId;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: JobId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request queue is full ({capacity} pending). Please try again later.")]
    QueueFull { capacity: usize },

    #[error("Job {id} is not ready (state: {state})")]
    NotReady { id: JobId, state: JobState },

    #[error("Request failed: {0}")]
    Generation(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Timed out waiting for job {id} after {waited_secs}s")]
    Timeout { id: JobId, waited_secs: u64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing job record.
    pub fn job_not_found(id: JobId) -> Self {
        CoreError::NotFound { entity: "Job", id }
    }
}
