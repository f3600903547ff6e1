//! Text provider trait.

use crate::error::Result;
use crate::text::types::{GeneratedText, TextRequest};
use async_trait::async_trait;

/// Trait for text generation providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generates text for the given request.
    async fn generate_text(&self, request: &TextRequest) -> Result<GeneratedText>;

    /// Returns the model identifier this provider calls.
    fn model(&self) -> &str;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
