//! Presentation state for a front end driving the pipeline.
//!
//! A [`Session`] owns what a user sees: the job title they typed, whether a
//! generation is in flight, the last error, the creative prompt and the
//! images. Views observe it through a [`tokio::sync::watch`] channel, so a
//! loader can react while [`Session::generate`] is still awaiting the
//! remote models.

use crate::error::JobPostError;
use crate::export;
use crate::pipeline::{ErrorKind, GeneratedImage, Generation, JobTitle, Pipeline, PipelineFailure};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// Lines cycled through while a generation is running.
pub const LOADING_MESSAGES: [&str; 6] = [
    "Consulting the digital oracle...",
    "Waking up the AI's inner artist...",
    "Translating job titles into pure imagination...",
    "Painting pixels with lightning...",
    "Rummaging through the concept closet...",
    "Herding creative digital hamsters...",
];

/// How long each loading message stays up.
pub const LOADING_MESSAGE_INTERVAL: Duration = Duration::from_secs(2);

/// Endless rotation over [`LOADING_MESSAGES`].
#[derive(Debug, Clone, Default)]
pub struct LoadingMessages {
    next: usize,
}

impl LoadingMessages {
    /// Starts at the first message.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for LoadingMessages {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let message = LOADING_MESSAGES[self.next];
        self.next = (self.next + 1) % LOADING_MESSAGES.len();
        Some(message)
    }
}

/// Everything a view needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Text in the job title field, as typed.
    pub job_title: String,
    /// True while a generation is in flight.
    pub is_loading: bool,
    /// Message to show in place of results.
    pub error: Option<String>,
    /// Prompt from the latest run, once stage 1 has finished.
    pub creative_prompt: Option<String>,
    /// Images from the latest successful run.
    pub images: Vec<GeneratedImage>,
    /// Title the current images were generated for.
    pub generated_for: Option<JobTitle>,
}

impl SessionState {
    /// True when there is a prompt and images to show.
    pub fn has_results(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Errors from driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A generation is already running.
    #[error("a generation is already in progress")]
    Busy,

    /// The run failed; the message is already in the session state.
    #[error(transparent)]
    Failed(#[from] PipelineFailure),

    /// There is no image at the requested position.
    #[error("no generated image at index {0}")]
    NoSuchImage(usize),

    /// Writing the image to disk failed.
    #[error("export failed: {0}")]
    Export(#[from] JobPostError),
}

/// Presentation state plus the operations that mutate it.
#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an idle session with an empty job title.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state }
    }

    /// Returns a receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Replaces the job title field.
    pub fn set_job_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.state.send_modify(|s| s.job_title = title);
    }

    /// Runs the pipeline for the current job title.
    ///
    /// Blank titles are rejected here and never reach the pipeline. A run
    /// clears the previous prompt, images and error before it starts and
    /// keeps `is_loading` set until it finishes. Calls made while another
    /// run is in flight get [`SessionError::Busy`] and change nothing.
    pub async fn generate(&self, pipeline: &Pipeline) -> Result<Generation, SessionError> {
        let raw = {
            let state = self.state.borrow();
            if state.is_loading {
                return Err(SessionError::Busy);
            }
            state.job_title.clone()
        };
        let job_title = match JobTitle::parse(&raw) {
            Ok(title) => title,
            Err(failure) => {
                self.state
                    .send_modify(|s| s.error = Some(failure.message.clone()));
                return Err(failure.into());
            }
        };

        if !self.begin() {
            return Err(SessionError::Busy);
        }

        let prompt = match pipeline.generate_prompt(&job_title).await {
            Ok(prompt) => prompt,
            Err(failure) => return Err(self.fail(failure)),
        };
        self.state
            .send_modify(|s| s.creative_prompt = Some(prompt.clone()));

        let images = match pipeline.render_images(&prompt).await {
            Ok(images) => images,
            Err(failure) => return Err(self.fail(failure)),
        };

        let generation = Generation {
            job_title: job_title.clone(),
            prompt,
            images,
        };
        self.state.send_modify(|s| {
            s.images = generation.images.clone();
            s.generated_for = Some(job_title);
            s.error = None;
            s.is_loading = false;
        });
        Ok(generation)
    }

    /// Writes image `index` of the latest run into `dir`.
    pub async fn export(&self, index: usize, dir: &Path) -> Result<PathBuf, SessionError> {
        let (image, title) = {
            let state = self.state.borrow();
            let image = state
                .images
                .get(index)
                .cloned()
                .ok_or(SessionError::NoSuchImage(index))?;
            let title = state
                .generated_for
                .clone()
                .ok_or(SessionError::NoSuchImage(index))?;
            (image, title)
        };
        Ok(export::export_image(&image, &title, dir).await?)
    }

    /// Marks the session busy and clears the previous outcome, unless a run
    /// is already in flight. Returns whether the run may proceed.
    fn begin(&self) -> bool {
        let mut started = false;
        self.state.send_if_modified(|s| {
            if s.is_loading {
                return false;
            }
            s.is_loading = true;
            s.error = None;
            s.creative_prompt = None;
            s.images.clear();
            s.generated_for = None;
            started = true;
            true
        });
        started
    }

    fn fail(&self, failure: PipelineFailure) -> SessionError {
        debug_assert_ne!(failure.kind, ErrorKind::Validation);
        self.state.send_modify(|s| {
            s.error = Some(failure.message.clone());
            s.creative_prompt = None;
            s.is_loading = false;
        });
        failure.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{StubImages, StubText};
    use std::sync::Arc;

    fn pipeline(text: StubText, images: StubImages) -> (Pipeline, Arc<StubText>, Arc<StubImages>) {
        let text = Arc::new(text);
        let images = Arc::new(images);
        (Pipeline::new(text.clone(), images.clone()), text, images)
    }

    #[test]
    fn test_loading_messages_rotate() {
        let first_eight: Vec<_> = LoadingMessages::new().take(8).collect();
        assert_eq!(first_eight[0], LOADING_MESSAGES[0]);
        assert_eq!(first_eight[5], LOADING_MESSAGES[5]);
        assert_eq!(first_eight[6], LOADING_MESSAGES[0]);
        assert_eq!(first_eight[7], LOADING_MESSAGES[1]);
    }

    #[tokio::test]
    async fn test_blank_title_never_reaches_pipeline() {
        let (pipeline, text, images) =
            pipeline(StubText::replying("A 3D avatar"), StubImages::returning(&["a", "b"]));
        let session = Session::new();
        session.set_job_title("   ");

        let err = session.generate(&pipeline).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Failed(PipelineFailure { kind: ErrorKind::Validation, .. })
        ));
        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("Please enter a job title."));
        assert!(!state.is_loading);
        assert_eq!(text.calls(), 0);
        assert_eq!(images.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_generation_updates_state() {
        let (pipeline, _, _) = pipeline(
            StubText::replying("A 3D avatar..."),
            StubImages::returning(&["/9j/AAAA", "/9j/BBBB"]),
        );
        let session = Session::new();
        session.set_job_title("Data Scientist");

        let generation = session.generate(&pipeline).await.unwrap();

        let state = session.state();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(state.has_results());
        assert_eq!(state.creative_prompt.as_deref(), Some("A 3D avatar..."));
        assert_eq!(state.images, generation.images);
        assert_eq!(state.generated_for.unwrap().as_str(), "Data Scientist");
    }

    #[tokio::test]
    async fn test_failure_replaces_previous_results() {
        let session = Session::new();
        session.set_job_title("Chef");

        let (ok_pipeline, _, _) =
            pipeline(StubText::replying("A 3D avatar"), StubImages::returning(&["a", "b"]));
        session.generate(&ok_pipeline).await.unwrap();
        assert!(session.state().has_results());

        let (bad_pipeline, _, _) = pipeline(StubText::replying("A 3D avatar"), StubImages::failing());
        let err = session.generate(&bad_pipeline).await.unwrap_err();

        assert!(matches!(err, SessionError::Failed(_)));
        let state = session.state();
        assert!(!state.is_loading);
        assert!(!state.has_results());
        assert!(state.creative_prompt.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some(ErrorKind::ImageGeneration.message())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_flag_visible_while_running() {
        let (pipeline, _, _) = pipeline(
            StubText::delayed(Duration::from_secs(3), "A 3D avatar"),
            StubImages::returning(&["a", "b"]),
        );
        let session = Session::new();
        session.set_job_title("Chef");
        let mut rx = session.subscribe();

        let run = session.generate(&pipeline);
        tokio::pin!(run);

        tokio::select! {
            biased;
            _ = &mut run => panic!("run finished before the prompt stage resolved"),
            changed = rx.changed() => changed.unwrap(),
        }
        {
            let state = rx.borrow_and_update();
            assert!(state.is_loading);
            assert!(state.error.is_none());
            assert!(!state.has_results());
        }

        run.await.unwrap();
        assert!(!session.state().is_loading);
    }

    #[tokio::test]
    async fn test_second_run_while_busy_is_rejected() {
        let (pipeline, text, _) =
            pipeline(StubText::hanging(), StubImages::returning(&["a", "b"]));
        let session = Session::new();
        session.set_job_title("Chef");

        let first = session.generate(&pipeline);
        tokio::pin!(first);

        // Poll the first run until it is parked inside the text provider.
        tokio::select! {
            biased;
            _ = &mut first => panic!("hanging provider returned"),
            _ = tokio::task::yield_now() => {}
        }
        assert!(session.state().is_loading);

        let second = session.generate(&pipeline).await;
        assert!(matches!(second, Err(SessionError::Busy)));
        assert_eq!(text.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_title_while_busy_leaves_run_untouched() {
        let (pipeline, text, _) = pipeline(
            StubText::delayed(Duration::from_secs(3), "A 3D avatar"),
            StubImages::returning(&["a", "b"]),
        );
        let session = Session::new();
        session.set_job_title("Chef");

        let first = session.generate(&pipeline);
        tokio::pin!(first);
        tokio::select! {
            biased;
            _ = &mut first => panic!("run finished before the prompt stage resolved"),
            _ = tokio::task::yield_now() => {}
        }
        assert!(session.state().is_loading);

        session.set_job_title("   ");
        let second = session.generate(&pipeline).await;
        assert!(matches!(second, Err(SessionError::Busy)));
        assert!(session.state().error.is_none());

        first.await.unwrap();
        let state = session.state();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.images.len(), 2);
        assert_eq!(text.calls(), 1);
    }

    #[tokio::test]
    async fn test_export_uses_generated_title() {
        let (pipeline, _, _) = pipeline(
            StubText::replying("A 3D avatar"),
            StubImages::returning(&["/9j/4A==", "/9j/4A=="]),
        );
        let session = Session::new();
        session.set_job_title("Senior React Engineer!");
        session.generate(&pipeline).await.unwrap();
        session.set_job_title("Something else");

        let dir = tempfile::tempdir().unwrap();
        let path = session.export(1, dir.path()).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("job_post_senior_react_engineer__"));
        assert!(matches!(
            session.export(2, dir.path()).await,
            Err(SessionError::NoSuchImage(2))
        ));
    }
}
