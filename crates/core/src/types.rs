/// Jobs are identified by random UUIDs assigned at admission.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Allocate a fresh job id.
pub fn new_job_id() -> JobId {
    uuid::Uuid::new_v4()
}
