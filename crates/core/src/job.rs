//! Job lifecycle states and consumption modes.
//!
//! A job moves strictly forward through
//! `Queued -> Processing -> (Completed | Failed)`. The transition table
//! lives here so the store and the worker agree on it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Admitted and waiting in the queue.
    Queued,
    /// Picked up by the worker; the generation call is outstanding.
    Processing,
    /// Finished with an image.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobState {
    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// `Completed` and `Failed` are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Processing)
                | (JobState::Processing, JobState::Completed)
                | (JobState::Processing, JobState::Failed)
        )
    }

    /// Validate a transition, returning [`CoreError::Conflict`] when it would
    /// move the job backwards or skip a step.
    pub fn check_transition(self, next: JobState) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Illegal job state transition: {self} -> {next}"
            )))
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobMode
// ---------------------------------------------------------------------------

/// How the submitting client consumes the job outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Client receives the id immediately and polls status/result.
    Polled,
    /// Client's request stays open until the job finishes.
    Blocking,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
