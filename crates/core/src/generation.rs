//! Generation parameters, model selectors, and validation.
//!
//! Everything here is checked at admission time so that malformed requests
//! are rejected before they take a queue slot or reach the backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Prompt used when the client does not supply one.
pub const DEFAULT_PROMPT: &str = "1girl, 1boy";
/// Seed used when the client does not supply one.
pub const DEFAULT_SEED: u64 = 0;
/// Model selector used when the client does not supply one.
pub const DEFAULT_MODEL: &str = "Anime_v45_Full";

/// Longest prompt (in characters) accepted at admission.
pub const MAX_PROMPT_LEN: usize = 4000;
/// Inclusive upper bound for the guidance scale.
pub const MAX_GUIDANCE_SCALE: f64 = 10.0;

// ---------------------------------------------------------------------------
// ImageModel
// ---------------------------------------------------------------------------

/// Image models the backend can be asked for.
///
/// Parsed from the client-facing selector (e.g. `Anime_v45_Full`) and
/// mapped to the backend's wire identifier via [`ImageModel::wire_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageModel {
    #[serde(rename = "Anime_v45_Full")]
    AnimeV45Full,
    #[serde(rename = "Anime_v45_Curated")]
    AnimeV45Curated,
    #[serde(rename = "Anime_v4_Full")]
    AnimeV4Full,
    #[serde(rename = "Anime_v4_Curated")]
    AnimeV4Curated,
    #[serde(rename = "Anime_v3")]
    AnimeV3,
    #[serde(rename = "Furry_v3")]
    FurryV3,
}

impl ImageModel {
    /// All supported models, in selector order.
    pub const ALL: [ImageModel; 6] = [
        ImageModel::AnimeV45Full,
        ImageModel::AnimeV45Curated,
        ImageModel::AnimeV4Full,
        ImageModel::AnimeV4Curated,
        ImageModel::AnimeV3,
        ImageModel::FurryV3,
    ];

    /// Client-facing selector name.
    pub fn selector(self) -> &'static str {
        match self {
            ImageModel::AnimeV45Full => "Anime_v45_Full",
            ImageModel::AnimeV45Curated => "Anime_v45_Curated",
            ImageModel::AnimeV4Full => "Anime_v4_Full",
            ImageModel::AnimeV4Curated => "Anime_v4_Curated",
            ImageModel::AnimeV3 => "Anime_v3",
            ImageModel::FurryV3 => "Furry_v3",
        }
    }

    /// Identifier sent to the generation backend.
    pub fn wire_name(self) -> &'static str {
        match self {
            ImageModel::AnimeV45Full => "nai-diffusion-4-5-full",
            ImageModel::AnimeV45Curated => "nai-diffusion-4-5-curated",
            ImageModel::AnimeV4Full => "nai-diffusion-4-full",
            ImageModel::AnimeV4Curated => "nai-diffusion-4-curated-preview",
            ImageModel::AnimeV3 => "nai-diffusion-3",
            ImageModel::FurryV3 => "nai-diffusion-furry-3",
        }
    }

    /// V4-family models take structured prompt objects instead of a bare string.
    pub fn is_v4_family(self) -> bool {
        matches!(
            self,
            ImageModel::AnimeV45Full
                | ImageModel::AnimeV45Curated
                | ImageModel::AnimeV4Full
                | ImageModel::AnimeV4Curated
        )
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for ImageModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageModel::ALL
            .into_iter()
            .find(|m| m.selector() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid model name: \"{s}\"")))
    }
}

// ---------------------------------------------------------------------------
// GenerationParams
// ---------------------------------------------------------------------------

/// Validated parameters for one image generation.
///
/// Opaque to the queue: the worker hands them to the backend unexamined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub seed: u64,
    pub model: ImageModel,
    pub negative_prompt: Option<String>,
    pub guidance_scale: Option<f64>,
}

impl GenerationParams {
    /// Build parameters from raw client input, validating every field.
    pub fn parse(
        prompt: impl Into<String>,
        seed: u64,
        model: &str,
        negative_prompt: Option<String>,
        guidance_scale: Option<f64>,
    ) -> Result<Self, CoreError> {
        let params = Self {
            prompt: prompt.into(),
            seed,
            model: model.parse()?,
            negative_prompt: negative_prompt.filter(|s| !s.trim().is_empty()),
            guidance_scale,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check field-level constraints.
    ///
    /// Rules:
    /// - Prompt must not be blank and must not exceed `MAX_PROMPT_LEN` characters.
    /// - Negative prompt, if present, must not exceed `MAX_PROMPT_LEN` characters.
    /// - Guidance scale, if present, must be finite and within `0.0..=MAX_GUIDANCE_SCALE`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation(
                "Prompt must not be empty".to_string(),
            ));
        }
        if self.prompt.chars().count() > MAX_PROMPT_LEN {
            return Err(CoreError::Validation(format!(
                "Prompt must not exceed {MAX_PROMPT_LEN} characters"
            )));
        }
        if let Some(negative) = &self.negative_prompt {
            if negative.chars().count() > MAX_PROMPT_LEN {
                return Err(CoreError::Validation(format!(
                    "Negative prompt must not exceed {MAX_PROMPT_LEN} characters"
                )));
            }
        }
        if let Some(scale) = self.guidance_scale {
            if !scale.is_finite() || !(0.0..=MAX_GUIDANCE_SCALE).contains(&scale) {
                return Err(CoreError::Validation(format!(
                    "Guidance scale must be between 0 and {MAX_GUIDANCE_SCALE}, got {scale}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
