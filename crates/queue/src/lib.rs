//! Bounded single-worker job queue for image generation.
//!
//! [`JobQueue`] owns the admission queue and the job store. [`Worker`]
//! drains it one job at a time against a
//! [`GenerationBackend`](genqueue_backend::GenerationBackend), and
//! [`reaper::run`] evicts old records on a fixed cadence.

pub mod admission;
pub mod config;
pub mod reaper;
pub mod service;
pub mod store;
pub mod worker;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use genqueue_core::error::CoreError;

pub use config::{BackoffConfig, QueueConfig};
pub use service::{BlockingTicket, JobQueue, QueueStatus};
pub use store::JobSummary;
pub use worker::Worker;

/// What the worker reports for a finished job: the image bytes, or the
/// reason it failed.
pub type JobOutcome = Result<Arc<[u8]>, CoreError>;
