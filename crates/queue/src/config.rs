use std::time::Duration;

/// Default number of pending jobs the admission queue accepts.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10;

/// Default age after which job records are evicted: 1 hour.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// Default reaper cadence: 10 minutes.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(600);

/// Tuning for the admission queue, worker, and reaper.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of jobs waiting for the worker (the running job is
    /// not counted).
    pub max_queue_size: usize,
    /// Records older than this are evicted by the reaper regardless of state.
    pub retention: Duration,
    /// How often the reaper sweeps the job store.
    pub reap_interval: Duration,
    /// Pause applied by the worker after an infrastructure fault.
    pub worker_backoff: BackoffConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            retention: DEFAULT_RETENTION,
            reap_interval: DEFAULT_REAP_INTERVAL,
            worker_backoff: BackoffConfig::default(),
        }
    }
}

/// Tunable parameters for the worker's exponential backoff.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first fault.
    pub initial_delay: Duration,
    /// Upper bound on the delay between consecutive faults.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each consecutive fault.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}
