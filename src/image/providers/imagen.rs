//! Imagen (Google) image generation provider.

use crate::error::{JobPostError, Result};
use crate::google;
use crate::image::provider::ImageProvider;
use crate::image::types::{ImageFormat, ImagePayload, ImageRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Imagen model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImagenModel {
    /// Imagen 3 (`imagen-3.0-generate-002`).
    #[default]
    Imagen3,
    /// Imagen 4 (`imagen-4.0-generate-001`).
    Imagen4,
    /// Imagen 4 Fast (`imagen-4.0-fast-generate-001`).
    Imagen4Fast,
    /// Any other model identifier.
    Custom(String),
}

impl ImagenModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Imagen3 => "imagen-3.0-generate-002",
            Self::Imagen4 => "imagen-4.0-generate-001",
            Self::Imagen4Fast => "imagen-4.0-fast-generate-001",
            Self::Custom(id) => id,
        }
    }

    /// Maps a model identifier to a known variant, or `Custom`.
    pub fn from_id(id: &str) -> Self {
        match id {
            "imagen-3.0-generate-002" => Self::Imagen3,
            "imagen-4.0-generate-001" => Self::Imagen4,
            "imagen-4.0-fast-generate-001" => Self::Imagen4Fast,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for ImagenProvider.
#[derive(Debug, Clone, Default)]
pub struct ImagenProviderBuilder {
    api_key: Option<String>,
    model: ImagenModel,
    client: Option<reqwest::Client>,
}

impl ImagenProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, `GEMINI_API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Imagen model variant.
    pub fn model(mut self, model: ImagenModel) -> Self {
        self.model = model;
        self
    }

    /// Shares an existing HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<ImagenProvider> {
        let api_key = google::resolve_api_key(self.api_key)?;

        Ok(ImagenProvider {
            client: self.client.unwrap_or_default(),
            api_key,
            model: self.model,
        })
    }
}

/// Imagen image generation provider.
pub struct ImagenProvider {
    client: reqwest::Client,
    api_key: String,
    model: ImagenModel,
}

impl ImagenProvider {
    /// Creates a new `ImagenProviderBuilder`.
    pub fn builder() -> ImagenProviderBuilder {
        ImagenProviderBuilder::new()
    }

    async fn generate_impl(&self, request: &ImageRequest) -> Result<Vec<ImagePayload>> {
        if request.prompt.trim().is_empty() {
            return Err(JobPostError::InvalidRequest("prompt is empty".into()));
        }

        let start = Instant::now();
        let url = format!("{}/models/{}:predict", google::BASE_URL, self.model.as_str());
        let body = PredictRequest::from_image_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(google::parse_error(status.as_u16(), &text, &headers));
        }

        let predict: PredictResponse = response.json().await?;
        let images = predict.into_payloads(request.format);

        tracing::debug!(
            model = self.model.as_str(),
            requested = request.number_of_images,
            returned = images.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Imagen predict complete"
        );

        Ok(images)
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<ImagePayload>> {
        self.generate_impl(request).await
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }

    async fn health_check(&self) -> Result<()> {
        google::check_model(&self.client, &self.api_key, self.model.as_str()).await
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

impl PredictRequest {
    fn from_image_request(req: &ImageRequest) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: req.prompt.clone(),
            }],
            parameters: PredictParameters {
                sample_count: req.number_of_images,
                aspect_ratio: req.aspect_ratio.as_str().to_string(),
                output_options: OutputOptions {
                    mime_type: req.format.mime_type().to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

impl PredictResponse {
    /// Keeps predictions that carry image bytes. Safety-filtered entries are
    /// dropped with a log line.
    fn into_payloads(self, requested: ImageFormat) -> Vec<ImagePayload> {
        self.predictions
            .into_iter()
            .filter_map(|p| {
                if let Some(reason) = p.rai_filtered_reason {
                    tracing::warn!(reason = %reason, "Imagen filtered a generated image");
                }
                let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
                let format = p
                    .mime_type
                    .as_deref()
                    .and_then(ImageFormat::from_mime_type)
                    .unwrap_or(requested);
                Some(ImagePayload::new(data, format))
            })
            .collect()
    }
}
