//! Fake backends and helpers shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use genqueue_backend::{
    BackendError, GeneratedImage, GenerationBackend, GenerationSession, ImagePreset, ImageStream,
};
use genqueue_core::error::CoreError;
use genqueue_core::generation::{GenerationParams, ImageModel};
use genqueue_core::job::JobState;
use genqueue_core::types::JobId;

use crate::JobQueue;

pub fn params(prompt: &str) -> GenerationParams {
    GenerationParams::parse(prompt, 1, "Anime_v45_Full", None, None).unwrap()
}

/// Poll until `id` reaches a terminal state (or disappears), failing the
/// test after two seconds.
pub async fn wait_terminal(queue: &JobQueue, id: JobId) -> Result<JobState, CoreError> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        match queue.job_status(id).await {
            Ok(state) if !state.is_terminal() => {}
            other => return other,
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {id} did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// What a [`ScriptedBackend`] does for a given prompt.
#[derive(Clone, Copy)]
pub enum Script {
    /// Return the prompt bytes as the image.
    Echo,
    /// Fail with `BackendError::Other("boom")`.
    Boom,
    /// Produce an empty stream.
    Empty,
    /// Panic inside the generation call.
    Panic,
}

/// Backend that records call order and concurrency, and behaves per prompt.
#[derive(Clone)]
pub struct ScriptedBackend {
    shared: Arc<Shared>,
}

struct Shared {
    script: fn(&str) -> Script,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(script: fn(&str) -> Script, delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                script,
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn echo() -> Self {
        Self::new(|_| Script::Echo, Duration::from_millis(10))
    }

    /// Prompts in the order the backend received them.
    pub fn calls(&self) -> Vec<String> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// Highest number of generation calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }
}

struct ScriptedSession {
    shared: Arc<Shared>,
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn open_session(&self) -> Result<Box<dyn GenerationSession>, BackendError> {
        Ok(Box::new(ScriptedSession {
            shared: Arc::clone(&self.shared),
        }))
    }
}

impl GenerationSession for ScriptedSession {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        _model: ImageModel,
        _preset: &'a ImagePreset,
    ) -> ImageStream<'a> {
        let shared = &self.shared;
        stream::once(async move {
            let running = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            shared.max_in_flight.fetch_max(running, Ordering::SeqCst);
            shared.calls.lock().unwrap().push(prompt.to_string());

            tokio::time::sleep(shared.delay).await;
            shared.in_flight.fetch_sub(1, Ordering::SeqCst);

            (shared.script)(prompt)
        })
        .flat_map(move |script| {
            let items = match script {
                Script::Echo => vec![Ok(GeneratedImage {
                    name: "image_0.png".to_string(),
                    bytes: prompt.as_bytes().to_vec(),
                })],
                Script::Boom => vec![Err(BackendError::Other("boom".to_string()))],
                Script::Empty => Vec::new(),
                Script::Panic => panic!("backend crashed"),
            };
            stream::iter(items)
        })
        .boxed()
    }
}
