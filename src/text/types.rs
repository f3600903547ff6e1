//! Core types for text generation.

use serde::{Deserialize, Serialize};

/// A request to generate text from a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    /// The full prompt sent to the model.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_output_tokens: Option<u32>,
}

impl TextRequest {
    /// Creates a new request with the given prompt and model defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: None,
        }
    }

    /// Sets the output token limit.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    /// Generated text, untrimmed.
    pub text: String,
    /// Model that produced it.
    pub model: String,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}
