//! Pipeline error types.

use slidecast_models::Stage;
use thiserror::Error;

use crate::retry::AttemptTimeout;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage was requested before its inputs exist; the stage is not
    /// attempted and no state changes.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("Image generation failed: {0}")]
    ImageFailed(String),

    #[error("Audio generation failed: {0}")]
    AudioFailed(String),

    #[error("Video creation failed: {0}")]
    VideoFailed(String),

    #[error("Client error: {0}")]
    Client(#[from] slidecast_client::ClientError),

    #[error("Media error: {0}")]
    Media(#[from] slidecast_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::ScriptFailed(msg.into())
    }

    pub fn image_failed(msg: impl Into<String>) -> Self {
        Self::ImageFailed(msg.into())
    }

    pub fn audio_failed(msg: impl Into<String>) -> Self {
        Self::AudioFailed(msg.into())
    }

    pub fn video_failed(msg: impl Into<String>) -> Self {
        Self::VideoFailed(msg.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, PipelineError::Precondition(_))
    }

    /// Stage the error is attributed to, when one applies.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::ScriptFailed(_) => Some(Stage::Script),
            PipelineError::ImageFailed(_) => Some(Stage::Image),
            PipelineError::AudioFailed(_) => Some(Stage::Audio),
            PipelineError::VideoFailed(_) => Some(Stage::Video),
            _ => None,
        }
    }

    /// Fatal capability failures are not worth retrying at any level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Media(e) if e.is_fatal_capability())
    }
}

impl From<AttemptTimeout> for PipelineError {
    fn from(timeout: AttemptTimeout) -> Self {
        PipelineError::AudioFailed(format!(
            "attempt timed out after {} seconds",
            timeout.limit.as_secs()
        ))
    }
}
