//! Generation presets applied to every queued job.

use genqueue_core::generation::{GenerationParams, ImageModel};
use serde::Serialize;

/// Sampling steps used for every job.
pub const DEFAULT_STEPS: u32 = 28;
/// Guidance scale used when the client does not supply one.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 5.0;
/// Sampler name sent to the backend.
pub const DEFAULT_SAMPLER: &str = "k_euler_ancestral";

/// Output canvas sizes understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    #[serde(rename = "Normal_Portrait_v3")]
    NormalPortraitV3,
    #[serde(rename = "Normal_Landscape_v3")]
    NormalLandscapeV3,
    #[serde(rename = "Normal_Square_v3")]
    NormalSquareV3,
}

impl Resolution {
    /// `(width, height)` in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::NormalPortraitV3 => (832, 1216),
            Resolution::NormalLandscapeV3 => (1216, 832),
            Resolution::NormalSquareV3 => (1024, 1024),
        }
    }
}

/// Full parameter set for one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePreset {
    pub steps: u32,
    pub seed: u64,
    pub resolution: Resolution,
    pub scale: f64,
    pub sampler: &'static str,
    pub n_samples: u32,
    pub negative_prompt: Option<String>,
    /// Per-character prompts (V4 models). Always empty for queued jobs.
    pub characters: Vec<String>,
}

impl ImagePreset {
    /// Backend defaults for a model.
    pub fn for_model(_model: ImageModel) -> Self {
        Self {
            steps: DEFAULT_STEPS,
            seed: 0,
            resolution: Resolution::NormalSquareV3,
            scale: DEFAULT_GUIDANCE_SCALE,
            sampler: DEFAULT_SAMPLER,
            n_samples: 1,
            negative_prompt: None,
            characters: Vec::new(),
        }
    }

    /// Preset for a queued job: model defaults overlaid with the job's
    /// seed, negative prompt, and guidance scale.
    pub fn for_params(params: &GenerationParams) -> Self {
        let mut preset = Self::for_model(params.model);
        preset.seed = params.seed;
        preset.negative_prompt = params.negative_prompt.clone();
        if let Some(scale) = params.guidance_scale {
            preset.scale = scale;
        }
        preset
    }
}
