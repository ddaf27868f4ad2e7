#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use futures::stream::{self, StreamExt};
use genqueue_backend::{
    BackendError, GeneratedImage, GenerationBackend, GenerationSession, ImagePreset, ImageStream,
};
use genqueue_core::generation::ImageModel;
use genqueue_queue::{BackoffConfig, JobQueue, QueueConfig, Worker};
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use genqueue_api::config::ServerConfig;
use genqueue_api::router::build_app_router;
use genqueue_api::state::AppState;

/// PNG signature followed by a minimal IHDR tag, enough for format sniffing.
pub const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(max_queue_size: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        blocking_wait_timeout: Some(Duration::from_secs(10)),
        backend_url: "http://backend.invalid".to_string(),
        backend_timeout: Duration::from_secs(30),
        queue: QueueConfig {
            max_queue_size,
            worker_backoff: BackoffConfig {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
                multiplier: 2.0,
            },
            ..QueueConfig::default()
        },
    }
}

/// A router plus the queue behind it, optionally with a running worker.
pub struct TestApp {
    pub router: Router,
    pub queue: Arc<JobQueue>,
    cancel: CancellationToken,
}

impl TestApp {
    /// App with no worker: admitted jobs stay queued.
    pub fn without_worker(config: ServerConfig) -> Self {
        let queue = JobQueue::new(config.queue.clone());
        let state = AppState {
            config: Arc::new(config.clone()),
            queue: Arc::clone(&queue),
        };

        Self {
            router: build_app_router(state, &config),
            queue,
            cancel: CancellationToken::new(),
        }
    }

    /// App with a worker draining the queue against `FakeBackend`.
    pub fn with_worker(config: ServerConfig) -> Self {
        let app = Self::without_worker(config);
        let worker = Worker::new(Arc::clone(&app.queue), Arc::new(FakeBackend));
        tokio::spawn(worker.run(app.cancel.clone()));
        app
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Backend whose behaviour is chosen by the prompt:
///
/// - `boom`: fails with "boom"
/// - `jpeg`: returns JPEG magic bytes
/// - `slow`: sleeps 500ms, then returns a PNG
/// - anything else: returns a PNG header followed by the prompt
pub struct FakeBackend;

struct FakeSession;

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn open_session(&self) -> Result<Box<dyn GenerationSession>, BackendError> {
        Ok(Box::new(FakeSession))
    }
}

impl GenerationSession for FakeSession {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        _model: ImageModel,
        _preset: &'a ImagePreset,
    ) -> ImageStream<'a> {
        stream::once(async move {
            match prompt {
                "boom" => Err(BackendError::Other("boom".to_string())),
                "jpeg" => Ok(image(vec![0xFF, 0xD8, 0xFF, 0xE0])),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(image(PNG_HEADER.to_vec()))
                }
                other => {
                    let mut bytes = PNG_HEADER.to_vec();
                    bytes.extend_from_slice(other.as_bytes());
                    Ok(image(bytes))
                }
            }
        })
        .boxed()
    }
}

fn image(bytes: Vec<u8>) -> GeneratedImage {
    GeneratedImage {
        name: "image_0.png".to_string(),
        bytes,
    }
}

/// Send a request with the given method and no body.
pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll `/status/{id}` until the job reaches a terminal state, failing the
/// test after two seconds. Returns the final status body.
pub async fn wait_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let json = body_json(get(app.clone(), &format!("/status/{job_id}")).await).await;
        if json["state"] == "completed" || json["state"] == "failed" {
            return json;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} did not finish in time: {json}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
