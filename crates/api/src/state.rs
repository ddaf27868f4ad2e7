use std::sync::Arc;

use genqueue_queue::JobQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The single generation queue; the worker and reaper hold the same `Arc`.
    pub queue: Arc<JobQueue>,
}
