//! REST client for the hosted image generation API.
//!
//! Wraps the `POST /ai/generate-image` endpoint using [`reqwest`]. The
//! endpoint answers with a zip archive holding one image per sample; the
//! archive entries are decoded lazily and surfaced as an [`ImageStream`].

use std::io::{Cursor, Read};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use genqueue_core::generation::ImageModel;
use zip::ZipArchive;

use crate::error::BackendError;
use crate::preset::ImagePreset;
use crate::{GeneratedImage, GenerationBackend, GenerationSession, ImageStream};

/// Default base URL of the hosted image API.
pub const DEFAULT_BASE_URL: &str = "https://image.novelai.net";

/// Default upper bound on one generation request, end to end.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Cap on the buffer preallocated for one archive entry. Larger entries
/// still decode; the header's size claim is not trusted beyond this.
const MAX_ENTRY_PREALLOC: u64 = 16 * 1024 * 1024;

/// HTTP backend for the hosted image generation service.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpBackend {
    /// Create a backend for `base_url` authenticating with `api_token`.
    ///
    /// * `base_url` - e.g. `https://image.novelai.net` (no trailing slash).
    /// * `request_timeout` - a request still running after this fails with
    ///   [`BackendError::Request`], so a hung service cannot stall the worker.
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, base_url, api_token)
    }

    /// Create a backend reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn open_session(&self) -> Result<Box<dyn GenerationSession>, BackendError> {
        if self.api_token.trim().is_empty() {
            return Err(BackendError::Session(
                "no API token configured".to_string(),
            ));
        }
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            endpoint: format!("{}/ai/generate-image", self.base_url),
            api_token: self.api_token.clone(),
        }))
    }
}

/// Session bound to one job. Holds its own client handle so the backend
/// can be reconfigured without affecting in-flight work.
struct HttpSession {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl HttpSession {
    /// Submit the request and return the raw archive bytes.
    async fn fetch_archive(&self, body: &serde_json::Value) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        tracing::debug!(archive_bytes = bytes.len(), "Received image archive");
        Ok(bytes.to_vec())
    }
}

impl GenerationSession for HttpSession {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        model: ImageModel,
        preset: &'a ImagePreset,
    ) -> ImageStream<'a> {
        let body = build_request_body(prompt, model, preset);

        stream::once(async move { self.fetch_archive(&body).await })
            .flat_map(|archive| match archive {
                Ok(bytes) => archive_entries(bytes).left_stream(),
                Err(e) => stream::iter([Err(e)]).right_stream(),
            })
            .boxed()
    }
}

/// Build the JSON request body for one generation.
pub fn build_request_body(
    prompt: &str,
    model: ImageModel,
    preset: &ImagePreset,
) -> serde_json::Value {
    let (width, height) = preset.resolution.dimensions();
    let negative = preset.negative_prompt.as_deref().unwrap_or_default();

    let mut parameters = serde_json::json!({
        "width": width,
        "height": height,
        "scale": preset.scale,
        "sampler": preset.sampler,
        "steps": preset.steps,
        "n_samples": preset.n_samples,
        "seed": preset.seed,
        "negative_prompt": negative,
        "qualityToggle": true,
        "ucPreset": 0,
        "params_version": 3,
    });

    if model.is_v4_family() {
        parameters["characterPrompts"] = serde_json::json!(preset.characters);
        parameters["v4_prompt"] = serde_json::json!({
            "caption": { "base_caption": prompt, "char_captions": [] },
            "use_coords": false,
            "use_order": true,
        });
        parameters["v4_negative_prompt"] = serde_json::json!({
            "caption": { "base_caption": negative, "char_captions": [] },
        });
    }

    serde_json::json!({
        "input": prompt,
        "model": model.wire_name(),
        "action": "generate",
        "parameters": parameters,
    })
}

/// Decode a zip archive into a stream of images, one per entry, in
/// archive order. Decoding stops at the first bad entry.
pub fn archive_entries(
    bytes: Vec<u8>,
) -> impl Stream<Item = Result<GeneratedImage, BackendError>> + Send {
    let archive = ZipArchive::new(Cursor::new(bytes)).map_err(BackendError::from);

    stream::unfold(Some((archive, 0usize)), |state| async move {
        let (archive, index) = state?;
        match archive {
            Err(e) => Some((Err(e), None)),
            Ok(mut archive) => {
                if index >= archive.len() {
                    return None;
                }
                match read_entry(&mut archive, index) {
                    Ok(image) => Some((Ok(image), Some((Ok(archive), index + 1)))),
                    Err(e) => Some((Err(e), None)),
                }
            }
        }
    })
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
) -> Result<GeneratedImage, BackendError> {
    let mut file = archive.by_index(index)?;
    let name = file.name().to_string();
    let mut bytes = Vec::with_capacity(file.size().min(MAX_ENTRY_PREALLOC) as usize);
    file.read_to_end(&mut bytes)?;
    Ok(GeneratedImage { name, bytes })
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`BackendError::ApiError`] containing the
/// status and body text on failure.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(BackendError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
