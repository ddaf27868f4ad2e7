use std::str::FromStr;
use std::time::Duration;

use genqueue_backend::api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use genqueue_queue::{BackoffConfig, QueueConfig};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. The backend
/// API token is not part of this struct; `main` reads it separately so it
/// never ends up in a `Debug` dump.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds for every route except the blocking
    /// generation route (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on how long a blocking caller waits for its job.
    /// `None` waits indefinitely.
    pub blocking_wait_timeout: Option<Duration>,
    /// Base URL of the image generation service.
    pub backend_url: String,
    /// Upper bound on one backend request. A request that runs longer fails
    /// its job.
    pub backend_timeout: Duration,
    /// Admission, retention, and worker tuning.
    pub queue: QueueConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                     |
    /// |------------------------------|-----------------------------|
    /// | `HOST`                       | `0.0.0.0`                   |
    /// | `PORT`                       | `8000`                      |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`     |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                        |
    /// | `BLOCKING_WAIT_TIMEOUT_SECS` | `900` (`0` = no bound)      |
    /// | `MAX_QUEUE_SIZE`             | `10`                        |
    /// | `JOB_RETENTION_SECS`         | `3600`                      |
    /// | `REAPER_INTERVAL_SECS`       | `600`                       |
    /// | `WORKER_BACKOFF_MS`          | `1000`                      |
    /// | `BACKEND_URL`                | `https://image.novelai.net` |
    /// | `BACKEND_TIMEOUT_SECS`       | `300`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", "8000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", "30");

        let blocking_wait_secs: u64 = env_parse("BLOCKING_WAIT_TIMEOUT_SECS", "900");
        let blocking_wait_timeout =
            (blocking_wait_secs > 0).then(|| Duration::from_secs(blocking_wait_secs));

        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let default_backend_timeout = DEFAULT_REQUEST_TIMEOUT.as_secs().to_string();
        let backend_timeout =
            Duration::from_secs(env_parse("BACKEND_TIMEOUT_SECS", &default_backend_timeout));

        let backoff_ms: u64 = env_parse("WORKER_BACKOFF_MS", "1000");
        let queue = QueueConfig {
            max_queue_size: env_parse("MAX_QUEUE_SIZE", "10"),
            retention: Duration::from_secs(env_parse("JOB_RETENTION_SECS", "3600")),
            reap_interval: Duration::from_secs(env_parse("REAPER_INTERVAL_SECS", "600")),
            worker_backoff: BackoffConfig {
                initial_delay: Duration::from_millis(backoff_ms),
                ..BackoffConfig::default()
            },
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            blocking_wait_timeout,
            backend_url,
            backend_timeout,
            queue,
        }
    }
}

/// Read `name` from the environment, falling back to `default`.
///
/// Panics on a value that does not parse; misconfiguration fails at startup.
fn env_parse<T>(name: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.into());
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>()))
}
