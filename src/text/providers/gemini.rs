//! Gemini (Google) text generation provider.

use crate::error::{JobPostError, Result};
use crate::google;
use crate::text::provider::TextProvider;
use crate::text::types::{GeneratedText, TextRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Gemini text model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash (fast, economical).
    #[default]
    Flash,
    /// Gemini 2.5 Flash-Lite.
    FlashLite,
    /// Gemini 2.5 Pro.
    Pro,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::FlashLite => "gemini-2.5-flash-lite",
            Self::Pro => "gemini-2.5-pro",
            Self::Custom(id) => id,
        }
    }

    /// Maps a model identifier to a known variant, or `Custom`.
    pub fn from_id(id: &str) -> Self {
        match id {
            "gemini-2.5-flash" => Self::Flash,
            "gemini-2.5-flash-lite" => Self::FlashLite,
            "gemini-2.5-pro" => Self::Pro,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for GeminiTextProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiTextProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    client: Option<reqwest::Client>,
}

impl GeminiTextProviderBuilder {
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

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Shares an existing HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiTextProvider> {
        let api_key = google::resolve_api_key(self.api_key)?;

        Ok(GeminiTextProvider {
            client: self.client.unwrap_or_default(),
            api_key,
            model: self.model,
        })
    }
}

/// Gemini text generation provider.
pub struct GeminiTextProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
}

impl GeminiTextProvider {
    /// Creates a new `GeminiTextProviderBuilder`.
    pub fn builder() -> GeminiTextProviderBuilder {
        GeminiTextProviderBuilder::new()
    }

    async fn generate_impl(&self, request: &TextRequest) -> Result<GeneratedText> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            google::BASE_URL,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_text_request(request);

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

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response.into_text()?;

        Ok(GeneratedText {
            text,
            model: self.model.as_str().to_string(),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        })
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate_text(&self, request: &TextRequest) -> Result<GeneratedText> {
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
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GeminiRequest {
    fn from_text_request(req: &TextRequest) -> Self {
        let generation_config = req.max_output_tokens.map(|tokens| GeminiConfig {
            max_output_tokens: Some(tokens),
        });

        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiRequestPart {
                    text: req.prompt.clone(),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        // Blocks come back as HTTP 200 with prompt_feedback set
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(JobPostError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            JobPostError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => {
                    return Err(JobPostError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. still carry usable text
            }
        }

        let content = candidate.content.ok_or_else(|| {
            JobPostError::UnexpectedResponse("No content in Gemini candidate".into())
        })?;

        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            return Err(JobPostError::UnexpectedResponse(
                "No text in Gemini response".into(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::Flash.as_str(), "gemini-2.5-flash");
        assert_eq!(GeminiModel::Pro.as_str(), "gemini-2.5-pro");
        assert_eq!(GeminiModel::default(), GeminiModel::Flash);
    }

    #[test]
    fn test_gemini_model_from_id() {
        assert_eq!(
            GeminiModel::from_id("gemini-2.5-flash-lite"),
            GeminiModel::FlashLite
        );
        assert_eq!(
            GeminiModel::from_id("gemini-exp"),
            GeminiModel::Custom("gemini-exp".into())
        );
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiTextProviderBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::Pro)
            .build()
            .unwrap();
        assert_eq!(provider.model(), "gemini-2.5-pro");
    }

    #[test]
    fn test_request_construction_basic() {
        let req = TextRequest::new("Describe a chef");
        let json = serde_json::to_value(GeminiRequest::from_text_request(&req)).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Describe a chef");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let req = TextRequest::new("Describe a chef").with_max_output_tokens(256);
        let json = serde_json::to_value(GeminiRequest::from_text_request(&req)).unwrap();

        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "A 3D avatar "}, {"text": "of a chef"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_text().unwrap(), "A 3D avatar of a chef");
    }

    #[test]
    fn test_response_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        match resp.into_text() {
            Err(JobPostError::ContentBlocked(msg)) => {
                assert_eq!(msg, "Prompt was blocked due to safety");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(JobPostError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_response_without_text_is_unexpected() {
        let json = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(JobPostError::UnexpectedResponse(_))
        ));

        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(JobPostError::UnexpectedResponse(_))
        ));
    }
}
