//! Periodic eviction of old job records.
//!
//! Spawned once at startup next to the worker. Every tick drops records
//! submitted more than the configured retention ago, whatever their state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::JobQueue;

/// Run the reaper loop until `cancel` is triggered.
pub async fn run(queue: Arc<JobQueue>, cancel: CancellationToken) {
    let config = queue.config();
    // `interval` panics on a zero period.
    let period = config.reap_interval.max(Duration::from_millis(1));

    tracing::info!(
        retention_secs = config.retention.as_secs(),
        interval_secs = period.as_secs(),
        "Job reaper started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job reaper stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = queue.reap(Utc::now()).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job reaper: evicted expired records");
                } else {
                    tracing::debug!("Job reaper: nothing to evict");
                }
            }
        }
    }
}
