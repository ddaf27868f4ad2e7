//! Bounded FIFO of jobs waiting for the worker.
//!
//! [`AdmissionQueue`] is a plain data structure; [`crate::JobQueue`] owns
//! it behind a mutex so the capacity check, the push, and the
//! "currently processing" marker change together.

use std::collections::VecDeque;

use genqueue_core::error::CoreError;
use genqueue_core::generation::GenerationParams;
use genqueue_core::types::JobId;
use tokio::sync::oneshot;

use crate::JobOutcome;

/// A job waiting in (or just taken from) the admission queue.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: JobId,
    pub params: GenerationParams,
    /// Write-once result sink for blocking callers.
    pub waiter: Option<oneshot::Sender<JobOutcome>>,
}

/// Fixed-capacity FIFO plus the id of the job the worker holds.
#[derive(Debug)]
pub struct AdmissionQueue {
    capacity: usize,
    pending: VecDeque<QueuedJob>,
    current: Option<JobId>,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: VecDeque::with_capacity(capacity),
            current: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs waiting. The job being processed is not counted.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    /// Id of the job the worker is running, if any.
    pub fn current(&self) -> Option<JobId> {
        self.current
    }

    /// Append a job, or fail with [`CoreError::QueueFull`] without
    /// touching the queue.
    pub fn try_push(&mut self, job: QueuedJob) -> Result<(), CoreError> {
        if self.is_full() {
            return Err(CoreError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.pending.push_back(job);
        Ok(())
    }

    /// Take the oldest job and mark it as current.
    pub fn pop_for_processing(&mut self) -> Option<QueuedJob> {
        let job = self.pending.pop_front()?;
        self.current = Some(job.id);
        Some(job)
    }

    /// Clear the current marker if it still refers to `id`.
    pub fn finish_processing(&mut self, id: JobId) {
        if self.current == Some(id) {
            self.current = None;
        }
    }

    /// Remove every pending job, preserving the current marker.
    pub fn drain_pending(&mut self) -> Vec<QueuedJob> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use genqueue_core::types::new_job_id;

    use super::*;

    fn job() -> QueuedJob {
        QueuedJob {
            id: new_job_id(),
            params: GenerationParams::parse("cat", 1, "Anime_v45_Full", None, None).unwrap(),
            waiter: None,
        }
    }

    #[test]
    fn push_until_full_then_reject() {
        let mut queue = AdmissionQueue::new(2);
        queue.try_push(job()).unwrap();
        queue.try_push(job()).unwrap();
        assert!(queue.is_full());

        let err = queue.try_push(job()).unwrap_err();
        assert_matches!(err, CoreError::QueueFull { capacity: 2 });
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut queue = AdmissionQueue::new(0);
        assert!(queue.try_push(job()).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_is_fifo_and_sets_current() {
        let mut queue = AdmissionQueue::new(3);
        let first = job();
        let second = job();
        let (first_id, second_id) = (first.id, second.id);
        queue.try_push(first).unwrap();
        queue.try_push(second).unwrap();

        let popped = queue.pop_for_processing().unwrap();
        assert_eq!(popped.id, first_id);
        assert_eq!(queue.current(), Some(first_id));
        assert_eq!(queue.len(), 1);

        queue.finish_processing(first_id);
        assert_eq!(queue.current(), None);

        assert_eq!(queue.pop_for_processing().unwrap().id, second_id);
    }

    #[test]
    fn processing_job_frees_its_slot() {
        let mut queue = AdmissionQueue::new(1);
        queue.try_push(job()).unwrap();
        let _running = queue.pop_for_processing().unwrap();

        assert!(!queue.is_full());
        queue.try_push(job()).unwrap();
    }

    #[test]
    fn finish_ignores_stale_ids() {
        let mut queue = AdmissionQueue::new(1);
        let current = job();
        let current_id = current.id;
        queue.try_push(current).unwrap();
        queue.pop_for_processing();

        queue.finish_processing(new_job_id());
        assert_eq!(queue.current(), Some(current_id));
    }

    #[test]
    fn drain_keeps_current_marker() {
        let mut queue = AdmissionQueue::new(3);
        queue.try_push(job()).unwrap();
        queue.try_push(job()).unwrap();
        queue.try_push(job()).unwrap();
        let running = queue.pop_for_processing().unwrap();

        let drained = queue.drain_pending();

        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.current(), Some(running.id));
        assert_eq!(queue.capacity(), 3);
    }
}
