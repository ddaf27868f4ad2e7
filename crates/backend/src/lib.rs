//! Image generation backend client library.
//!
//! Defines the [`GenerationBackend`] seam the queue worker calls into,
//! the preset applied to every job, and [`HttpBackend`], the REST
//! implementation used in production.
//!
//! A backend hands out one scoped [`GenerationSession`] per job. The
//! session's `generate` call yields a lazy stream of images, of which the
//! queue only ever consumes the first.

pub mod api;
pub mod error;
pub mod preset;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use genqueue_core::generation::{GenerationParams, ImageModel};

pub use api::HttpBackend;
pub use error::BackendError;
pub use preset::ImagePreset;

/// One generated image plus its archive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Entry name reported by the backend (e.g. `image_0.png`).
    pub name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Lazy sequence of images produced by a single `generate` call.
pub type ImageStream<'a> = BoxStream<'a, Result<GeneratedImage, BackendError>>;

/// Factory for per-job sessions.
#[async_trait]
pub trait GenerationBackend: Send + Sync + 'static {
    /// Open a session scoped to a single job. The session is dropped once
    /// the job's first image has been read.
    async fn open_session(&self) -> Result<Box<dyn GenerationSession>, BackendError>;
}

/// A live connection to the generation service.
pub trait GenerationSession: Send + Sync {
    /// Start generating images for `prompt`.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        model: ImageModel,
        preset: &'a ImagePreset,
    ) -> ImageStream<'a>;
}

/// Run one job against `backend`: open a session, apply the job preset,
/// and return the first image produced.
pub async fn generate_first(
    backend: &dyn GenerationBackend,
    params: &GenerationParams,
) -> Result<GeneratedImage, BackendError> {
    let session = backend.open_session().await?;
    let preset = ImagePreset::for_params(params);

    let mut images = session.generate(&params.prompt, params.model, &preset);
    match images.next().await {
        Some(image) => image,
        None => Err(BackendError::NoOutput),
    }
}
