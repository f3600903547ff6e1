//! Environment-driven configuration.

use crate::error::{JobPostError, Result};
use crate::google::API_KEY_ENV_VARS;
use crate::image::providers::{ImagenModel, ImagenProvider};
use crate::pipeline::Pipeline;
use crate::text::providers::{GeminiModel, GeminiTextProvider};
use std::sync::Arc;
use std::time::Duration;

/// Overrides the text model identifier.
pub const TEXT_MODEL_ENV: &str = "JOBPOST_TEXT_MODEL";
/// Overrides the image model identifier.
pub const IMAGE_MODEL_ENV: &str = "JOBPOST_IMAGE_MODEL";
/// Per-stage timeout in seconds; `0` disables it.
pub const TIMEOUT_ENV: &str = "JOBPOST_TIMEOUT_SECS";

/// Default per-stage timeout.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings needed to build a [`Pipeline`].
#[derive(Clone)]
pub struct Config {
    /// Google Generative Language API key.
    pub api_key: String,
    /// Model used for the prompt stage.
    pub text_model: GeminiModel,
    /// Model used for the image stage.
    pub image_model: ImagenModel,
    /// Deadline applied to each stage, if any.
    pub stage_timeout: Option<Duration>,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// A missing API key is an error; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|key| non_empty(*key))
            .ok_or_else(|| {
                JobPostError::Config(format!(
                    "API key not set; define one of {}",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })?;

        let text_model = non_empty(TEXT_MODEL_ENV)
            .map(|id| GeminiModel::from_id(id.trim()))
            .unwrap_or_default();
        let image_model = non_empty(IMAGE_MODEL_ENV)
            .map(|id| ImagenModel::from_id(id.trim()))
            .unwrap_or_default();

        let stage_timeout = match non_empty(TIMEOUT_ENV) {
            None => Some(DEFAULT_STAGE_TIMEOUT),
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    JobPostError::Config(format!(
                        "{TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
        };

        Ok(Self {
            api_key,
            text_model,
            image_model,
            stage_timeout,
        })
    }

    /// Overrides the stage timeout; `None` disables it.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Builds the Gemini + Imagen pipeline described by this config.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let client = reqwest::Client::new();

        let text = GeminiTextProvider::builder()
            .api_key(self.api_key.clone())
            .model(self.text_model.clone())
            .client(client.clone())
            .build()?;
        let images = ImagenProvider::builder()
            .api_key(self.api_key.clone())
            .model(self.image_model.clone())
            .client(client)
            .build()?;

        let pipeline = Pipeline::new(Arc::new(text), Arc::new(images));
        Ok(match self.stage_timeout {
            Some(timeout) => pipeline.with_stage_timeout(timeout),
            None => pipeline,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("stage_timeout", &self.stage_timeout)
            .finish()
    }
}
