//! In-memory job store.
//!
//! Maps job ids to their [`JobRecord`]. Writers are the worker (state
//! transitions), the reaper (age-based eviction), and the administrative
//! clear. Request handlers only read.

use std::collections::HashMap;
use std::sync::Arc;

use genqueue_core::error::CoreError;
use genqueue_core::generation::GenerationParams;
use genqueue_core::job::{JobMode, JobState};
use genqueue_core::types::{JobId, Timestamp};
use serde::Serialize;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// Lifecycle phase with the data that only exists in that phase.
#[derive(Debug, Clone)]
pub enum JobPhase {
    Queued,
    Processing,
    Completed(Arc<[u8]>),
    Failed(String),
}

impl JobPhase {
    pub fn state(&self) -> JobState {
        match self {
            JobPhase::Queued => JobState::Queued,
            JobPhase::Processing => JobState::Processing,
            JobPhase::Completed(_) => JobState::Completed,
            JobPhase::Failed(_) => JobState::Failed,
        }
    }
}

/// Everything the service knows about one admitted job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub params: GenerationParams,
    pub mode: JobMode,
    pub submitted_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub phase: JobPhase,
}

impl JobRecord {
    /// A freshly admitted job.
    pub fn queued(id: JobId, params: GenerationParams, mode: JobMode, now: Timestamp) -> Self {
        Self {
            id,
            params,
            mode,
            submitted_at: now,
            started_at: None,
            finished_at: None,
            phase: JobPhase::Queued,
        }
    }

    pub fn state(&self) -> JobState {
        self.phase.state()
    }

    /// `Queued -> Processing`.
    pub fn begin_processing(&mut self, now: Timestamp) -> Result<(), CoreError> {
        self.state().check_transition(JobState::Processing)?;
        self.phase = JobPhase::Processing;
        self.started_at = Some(now);
        Ok(())
    }

    /// `Processing -> Completed`.
    pub fn complete(&mut self, image: Arc<[u8]>, now: Timestamp) -> Result<(), CoreError> {
        self.state().check_transition(JobState::Completed)?;
        self.phase = JobPhase::Completed(image);
        self.finished_at = Some(now);
        Ok(())
    }

    /// `Processing -> Failed`.
    pub fn fail(&mut self, error: impl Into<String>, now: Timestamp) -> Result<(), CoreError> {
        self.state().check_transition(JobState::Failed)?;
        self.phase = JobPhase::Failed(error.into());
        self.finished_at = Some(now);
        Ok(())
    }

    /// Serializable view without the image payload.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.id,
            state: self.state(),
            mode: self.mode,
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            error: match &self.phase {
                JobPhase::Failed(msg) => Some(msg.clone()),
                _ => None,
            },
        }
    }
}

/// Read-only projection of a [`JobRecord`] returned to status callers.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub state: JobState,
    pub mode: JobMode,
    pub submitted_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Concurrent map of job id to record.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Ids are never reused, so an existing entry is a
    /// bug in the caller and is reported as a conflict.
    pub async fn insert(&self, record: JobRecord) -> Result<(), CoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&record.id) {
            return Err(CoreError::Conflict(format!(
                "Job {} already exists",
                record.id
            )));
        }
        jobs.insert(record.id, record);
        Ok(())
    }

    /// Fetch a copy of a record.
    pub async fn get(&self, id: JobId) -> Result<JobRecord, CoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::job_not_found(id))
    }

    /// Apply `mutation` to a record in place under the write lock.
    pub async fn update<T>(
        &self,
        id: JobId,
        mutation: impl FnOnce(&mut JobRecord) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(&id)
            .ok_or_else(|| CoreError::job_not_found(id))?;
        mutation(record)
    }

    /// Remove a single record.
    pub async fn delete(&self, id: JobId) -> Result<JobRecord, CoreError> {
        self.jobs
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| CoreError::job_not_found(id))
    }

    /// All records, oldest submission first.
    pub async fn snapshot(&self) -> Vec<JobRecord> {
        let mut records: Vec<_> = self.jobs.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.submitted_at);
        records
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Drop every record submitted before `cutoff`, whatever its state.
    /// Returns the number of records removed.
    pub async fn evict_older_than(&self, cutoff: Timestamp) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, record| record.submitted_at >= cutoff);
        before - jobs.len()
    }

    /// Drop every record. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let count = jobs.len();
        jobs.clear();
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use genqueue_core::types::new_job_id;

    use super::*;

    fn params() -> GenerationParams {
        GenerationParams::parse("cat", 1, "Anime_v45_Full", None, None).unwrap()
    }

    fn record_at(submitted_at: Timestamp) -> JobRecord {
        JobRecord::queued(new_job_id(), params(), JobMode::Polled, submitted_at)
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = JobStore::new();
        let id = new_job_id();
        assert_matches!(
            store.get(id).await,
            Err(CoreError::NotFound { entity: "Job", id: missing }) if missing == id
        );
    }

    #[tokio::test]
    async fn insert_then_get_returns_queued_record() {
        let store = JobStore::new();
        let record = record_at(Utc::now());
        let id = record.id;

        store.insert(record).await.unwrap();

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.state(), JobState::Queued);
        assert!(fetched.started_at.is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_conflict() {
        let store = JobStore::new();
        let record = record_at(Utc::now());
        store.insert(record.clone()).await.unwrap();
        assert_matches!(store.insert(record).await, Err(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_applies_transition_and_timestamps() {
        let store = JobStore::new();
        let record = record_at(Utc::now());
        let id = record.id;
        store.insert(record).await.unwrap();

        let now = Utc::now();
        store.update(id, |r| r.begin_processing(now)).await.unwrap();
        store
            .update(id, |r| r.complete(Arc::from(&b"png"[..]), now))
            .await
            .unwrap();

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.state(), JobState::Completed);
        assert_eq!(fetched.started_at, Some(now));
        assert_eq!(fetched.finished_at, Some(now));
        assert_matches!(fetched.phase, JobPhase::Completed(bytes) if &*bytes == b"png");
    }

    #[tokio::test]
    async fn terminal_record_rejects_further_transitions() {
        let store = JobStore::new();
        let record = record_at(Utc::now());
        let id = record.id;
        store.insert(record).await.unwrap();

        let now = Utc::now();
        store.update(id, |r| r.begin_processing(now)).await.unwrap();
        store.update(id, |r| r.fail("boom", now)).await.unwrap();

        let again = store
            .update(id, |r| r.complete(Arc::from(&b"late"[..]), now))
            .await;
        assert_matches!(again, Err(CoreError::Conflict(_)));

        let fetched = store.get(id).await.unwrap();
        assert_matches!(fetched.phase, JobPhase::Failed(msg) if msg == "boom");
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = JobStore::new();
        let result = store
            .update(new_job_id(), |r| r.begin_processing(Utc::now()))
            .await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn evict_older_than_ignores_state() {
        let store = JobStore::new();
        let now = Utc::now();

        let old_queued = record_at(now - Duration::hours(2));
        let mut old_processing = record_at(now - Duration::hours(2));
        old_processing.begin_processing(now).unwrap();
        let fresh = record_at(now);
        let fresh_id = fresh.id;

        store.insert(old_queued).await.unwrap();
        store.insert(old_processing).await.unwrap();
        store.insert(fresh).await.unwrap();

        let evicted = store.evict_older_than(now - Duration::hours(1)).await;

        assert_eq!(evicted, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get(fresh_id).await.is_ok());
    }

    #[tokio::test]
    async fn snapshot_is_ordered_by_submission() {
        let store = JobStore::new();
        let now = Utc::now();
        let later = record_at(now);
        let earlier = record_at(now - Duration::minutes(5));
        let earlier_id = earlier.id;

        store.insert(later).await.unwrap();
        store.insert(earlier).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, earlier_id);
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let store = JobStore::new();
        let a = record_at(Utc::now());
        let a_id = a.id;
        store.insert(a).await.unwrap();
        store.insert(record_at(Utc::now())).await.unwrap();
        store.insert(record_at(Utc::now())).await.unwrap();

        store.delete(a_id).await.unwrap();
        assert!(store.get(a_id).await.is_err());

        assert_eq!(store.clear().await, 2);
        assert!(store.is_empty().await);
    }

    #[test]
    fn summary_exposes_error_only_when_failed() {
        let now = Utc::now();
        let mut record = record_at(now);
        assert!(record.summary().error.is_none());

        record.begin_processing(now).unwrap();
        record.fail("backend exploded", now).unwrap();

        let summary = record.summary();
        assert_eq!(summary.state, JobState::Failed);
        assert_eq!(summary.error.as_deref(), Some("backend exploded"));
    }
}
