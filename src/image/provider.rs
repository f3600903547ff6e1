//! Image provider trait.

use crate::error::Result;
use crate::image::types::{ImagePayload, ImageRequest};
use async_trait::async_trait;

/// Trait for image generation providers.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Renders images for the given request.
    ///
    /// Returns the payloads in the order the service produced them. An empty
    /// vector is a valid answer here; deciding whether that is a failure is
    /// up to the caller.
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<ImagePayload>>;

    /// Returns the model identifier this provider calls.
    fn model(&self) -> &str;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        "Imagen (Google)"
    }

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
