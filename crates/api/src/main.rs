use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use genqueue_backend::{GenerationBackend, HttpBackend};
use genqueue_queue::{reaper, JobQueue, Worker};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genqueue_api::config::ServerConfig;
use genqueue_api::router::build_app_router;
use genqueue_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "genqueue_api=debug,genqueue_queue=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        max_queue_size = config.queue.max_queue_size,
        backend_url = %config.backend_url,
        "Loaded server configuration"
    );

    // --- Generation backend ---
    let api_token = std::env::var("BACKEND_API_TOKEN").expect("BACKEND_API_TOKEN must be set");
    let backend: Arc<dyn GenerationBackend> = Arc::new(HttpBackend::new(
        config.backend_url.clone(),
        api_token,
        config.backend_timeout,
    ));

    // --- Queue, worker, reaper ---
    let queue = JobQueue::new(config.queue.clone());
    let cancel = CancellationToken::new();

    let worker = Worker::new(Arc::clone(&queue), backend);
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));
    let reaper_handle = tokio::spawn(reaper::run(Arc::clone(&queue), cancel.clone()));
    tracing::info!("Background services started (worker, reaper)");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        queue: Arc::clone(&queue),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), reaper_handle).await;
    tracing::info!("Job reaper stopped");

    // The worker only observes cancellation between jobs.
    if tokio::time::timeout(Duration::from_secs(30), worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("Generation worker still busy after 30s, abandoning in-flight job");
    } else {
        tracing::info!("Generation worker stopped");
    }

    let status = queue.queue_status().await;
    tracing::info!(
        abandoned = status.queue_size,
        "Graceful shutdown complete"
    );
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
