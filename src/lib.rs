#![warn(missing_docs)]
//! jobpost-art - playful social media art for job posts.
//!
//! Give it a job title; a Gemini text model writes a creative image prompt
//! featuring a funny 3D avatar of the role, then an Imagen model renders two
//! square JPEGs from that prompt.
//!
//! # Quick Start
//!
//! ```no_run
//! use jobpost_art::{Config, JobTitle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Config::from_env()?.build_pipeline()?;
//!     let title = JobTitle::parse("Data Scientist")?;
//!
//!     let generation = pipeline.run(&title).await?;
//!     println!("Prompt: {}", generation.prompt);
//!     for image in &generation.images {
//!         jobpost_art::export::export_image(image, &title, ".".as_ref()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Custom providers
//!
//! Both remote calls sit behind traits ([`TextProvider`], [`ImageProvider`]),
//! so a [`Pipeline`] can be assembled from any implementation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use jobpost_art::{GeminiTextProvider, ImagenProvider, Pipeline};
//!
//! # fn main() -> jobpost_art::Result<()> {
//! let pipeline = Pipeline::new(
//!     Arc::new(GeminiTextProvider::builder().api_key("...").build()?),
//!     Arc::new(ImagenProvider::builder().api_key("...").build()?),
//! );
//! # let _ = pipeline;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod export;
mod google;
pub mod image;
pub mod pipeline;
pub mod session;
pub mod text;

pub use config::{Config, DEFAULT_STAGE_TIMEOUT, IMAGE_MODEL_ENV, TEXT_MODEL_ENV, TIMEOUT_ENV};
pub use error::{JobPostError, Result};
pub use google::API_KEY_ENV_VARS;

pub use image::providers::{ImagenModel, ImagenProvider, ImagenProviderBuilder};
pub use image::{AspectRatio, ImageFormat, ImagePayload, ImageProvider, ImageRequest};

pub use text::providers::{GeminiModel, GeminiTextProvider, GeminiTextProviderBuilder};
pub use text::{GeneratedText, TextProvider, TextRequest};

pub use pipeline::{
    ErrorKind, GeneratedImage, Generation, JobTitle, Pipeline, PipelineFailure, PipelineResult,
};
pub use session::{Session, SessionError, SessionState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{JobPostError, Result};
    pub use crate::image::{ImagePayload, ImageProvider, ImageRequest};
    pub use crate::pipeline::{
        ErrorKind, GeneratedImage, Generation, JobTitle, Pipeline, PipelineFailure,
    };
    pub use crate::session::{Session, SessionError, SessionState};
    pub use crate::text::{GeneratedText, TextProvider, TextRequest};
    pub use crate::Config;
}
