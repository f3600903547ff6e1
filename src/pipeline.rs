//! The two-stage generation pipeline.
//!
//! A validated [`JobTitle`] goes to the text provider, which writes a
//! creative image prompt. That prompt goes to the image provider, which
//! renders [`IMAGES_PER_RUN`] square JPEGs. Either stage failing aborts the
//! run with a fixed, user-facing message; the underlying provider error is
//! only logged.

use crate::error::JobPostError;
use crate::image::{AspectRatio, ImageFormat, ImagePayload, ImageProvider, ImageRequest};
use crate::text::{TextProvider, TextRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of images requested per run.
pub const IMAGES_PER_RUN: u32 = 2;

/// Format every image is requested in.
pub const IMAGE_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Aspect ratio every image is requested in.
pub const IMAGE_ASPECT_RATIO: AspectRatio = AspectRatio::Square;

/// A job title that is non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobTitle(String);

impl JobTitle {
    /// Trims `raw` and rejects it if nothing is left.
    pub fn parse(raw: &str) -> Result<Self, PipelineFailure> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineFailure::new(ErrorKind::Validation));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the trimmed title.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which step of a generation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The job title was empty; the pipeline never ran.
    Validation,
    /// The text model could not produce a prompt.
    PromptGeneration,
    /// The image model failed or did not return exactly two images.
    ImageGeneration,
}

impl ErrorKind {
    /// The fixed message shown to users for this kind of failure.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation => "Please enter a job title.",
            Self::PromptGeneration => {
                "Failed to generate a creative prompt. The AI might be on a coffee break."
            }
            Self::ImageGeneration => {
                "Failed to generate images. Please try a different prompt or check your API key."
            }
        }
    }
}

/// A failed generation: a kind plus its flat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct PipelineFailure {
    /// What failed.
    pub kind: ErrorKind,
    /// Human-readable message, shown verbatim.
    pub message: String,
}

impl PipelineFailure {
    /// Creates a failure carrying the fixed message for `kind`.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }
}

/// One rendered image, ready to display or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    /// `data:image/jpeg;base64,...` URI.
    pub src: String,
    /// The creative prompt the image was rendered from.
    pub prompt: String,
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    /// The title the run was started with.
    pub job_title: JobTitle,
    /// The creative prompt written by the text model.
    pub prompt: String,
    /// The rendered images, in the order the image model returned them.
    pub images: Vec<GeneratedImage>,
}

/// Outcome of a single run.
pub type PipelineResult = Result<Generation, PipelineFailure>;

/// Builds the instruction sent to the text model for `job_title`.
pub fn creative_prompt_request(job_title: &JobTitle) -> String {
    format!(
        r#"Generate a funny, conceptual, and visually striking image prompt for a job post titled: "{title}". The prompt should describe a scene featuring a stylized, funny 3D human avatar character representing the job role. The style should be modern, playful, and suitable for social media. Avoid boring corporate cliches. The final image should look like a 3D render.

Example for 'Software Engineer': "A funny 3D avatar of a software engineer with oversized glasses, furiously typing on a glowing keyboard that's floating in a sea of colorful, abstract data streams. The character has a determined yet slightly manic expression, with lines of code swirling around their head like a halo. Style: 3D render, playful, vibrant colors."
Example for 'Marketing Manager': "A charming 3D avatar of a marketing manager, dressed as a magician, pulling a giant, glowing 'like' button out of a top hat. The character is winking at the camera, surrounded by floating charts and graphs that look like colorful confetti. Style: 3D render, funny, conceptual, bright lighting."

Now, generate a prompt for: "{title}""#,
        title = job_title.as_str()
    )
}

/// Orchestrates the prompt stage and the image stage.
#[derive(Clone)]
pub struct Pipeline {
    text: Arc<dyn TextProvider>,
    images: Arc<dyn ImageProvider>,
    stage_timeout: Option<Duration>,
}

impl Pipeline {
    /// Creates a pipeline with no stage timeout.
    pub fn new(text: Arc<dyn TextProvider>, images: Arc<dyn ImageProvider>) -> Self {
        Self {
            text,
            images,
            stage_timeout: None,
        }
    }

    /// Bounds each stage by `timeout`. An elapsed deadline fails that stage.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Returns the configured stage timeout.
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout
    }

    /// Returns the text provider.
    pub fn text_provider(&self) -> &dyn TextProvider {
        self.text.as_ref()
    }

    /// Returns the image provider.
    pub fn image_provider(&self) -> &dyn ImageProvider {
        self.images.as_ref()
    }

    /// Runs both stages for `job_title`.
    pub async fn run(&self, job_title: &JobTitle) -> PipelineResult {
        let prompt = self.generate_prompt(job_title).await?;
        let images = self.render_images(&prompt).await?;
        Ok(Generation {
            job_title: job_title.clone(),
            prompt,
            images,
        })
    }

    /// Stage 1: asks the text model for a creative prompt.
    pub async fn generate_prompt(&self, job_title: &JobTitle) -> Result<String, PipelineFailure> {
        let start = Instant::now();
        let request = TextRequest::new(creative_prompt_request(job_title));

        let generated = self
            .bounded(self.text.generate_text(&request))
            .await
            .map_err(|e| {
                tracing::error!(job_title = %job_title, "error generating image prompt: {e}");
                PipelineFailure::new(ErrorKind::PromptGeneration)
            })?;

        let prompt = generated.text.trim().to_string();
        if prompt.is_empty() {
            tracing::error!(job_title = %job_title, "text model returned an empty prompt");
            return Err(PipelineFailure::new(ErrorKind::PromptGeneration));
        }

        tracing::info!(
            job_title = %job_title,
            model = %generated.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "creative prompt ready"
        );
        Ok(prompt)
    }

    /// Stage 2: renders images for a prompt produced by stage 1.
    pub async fn render_images(&self, prompt: &str) -> Result<Vec<GeneratedImage>, PipelineFailure> {
        let start = Instant::now();
        let request = ImageRequest::new(prompt)
            .with_count(IMAGES_PER_RUN)
            .with_aspect_ratio(IMAGE_ASPECT_RATIO)
            .with_format(IMAGE_FORMAT);

        let payloads = self
            .bounded(self.images.generate_images(&request))
            .await
            .map_err(|e| {
                tracing::error!("error generating images: {e}");
                PipelineFailure::new(ErrorKind::ImageGeneration)
            })?;

        if payloads.len() != IMAGES_PER_RUN as usize {
            tracing::error!(
                requested = IMAGES_PER_RUN,
                returned = payloads.len(),
                "error generating images: wrong number of images"
            );
            return Err(PipelineFailure::new(ErrorKind::ImageGeneration));
        }

        tracing::info!(
            model = self.images.model(),
            count = payloads.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "images ready"
        );

        Ok(payloads
            .into_iter()
            .map(|payload| GeneratedImage {
                src: ImagePayload::new(payload.data, IMAGE_FORMAT).to_data_url(),
                prompt: prompt.to_string(),
            })
            .collect())
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = crate::Result<T>>,
    ) -> crate::Result<T> {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| JobPostError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("text_model", &self.text.model())
            .field("image_model", &self.images.model())
            .field("stage_timeout", &self.stage_timeout)
            .finish()
    }
}
