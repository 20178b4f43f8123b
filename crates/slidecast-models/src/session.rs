//! The single mutable aggregate for one generation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::{AudioBundle, EncodedAsset, ImageAsset};

/// State accumulated across the four pipeline stages.
///
/// Owned exclusively by the pipeline controller and mutated only by its
/// stage methods. Invariant: `video` is populated only when `script` is
/// non-empty, `images` is non-empty and `audio` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub script: String,
    pub images: Vec<ImageAsset>,
    pub audio: Option<AudioBundle>,
    pub video: Option<EncodedAsset>,
    /// Advisory flag: a stage is currently running. Re-entrant stage starts
    /// are rejected at the presentation layer, not here.
    pub is_generating: bool,
}

impl GenerationSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            script: String::new(),
            images: Vec::new(),
            audio: None,
            video: None,
            is_generating: false,
        }
    }

    pub fn has_script(&self) -> bool {
        !self.script.is_empty()
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Whether the video stage may start.
    pub fn video_ready(&self) -> bool {
        self.has_script() && self.has_images() && self.has_audio()
    }

    /// Check the session invariant: a video implies all of its inputs.
    pub fn invariant_holds(&self) -> bool {
        self.video.is_none() || self.video_ready()
    }

    /// Discard all generated content, keeping a fresh id.
    ///
    /// Total and idempotent: resetting an already-empty session is a no-op
    /// apart from the new id.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn populated() -> GenerationSession {
        let mut session = GenerationSession::new();
        session.script = "A story.".into();
        session.images.push(ImageAsset {
            source_url: "http://img/0".into(),
            prompt: "a scene".into(),
            index: 0,
        });
        session.audio = Some(AudioBundle::from_parts(vec![]));
        session
    }

    #[test]
    fn test_empty_session_preconditions() {
        let session = GenerationSession::new();
        assert!(!session.has_script());
        assert!(!session.video_ready());
        assert!(session.invariant_holds());
    }

    #[test]
    fn test_video_ready_requires_all_inputs() {
        let mut session = populated();
        assert!(session.video_ready());

        session.images.clear();
        assert!(!session.video_ready());
    }

    #[test]
    fn test_invariant_flags_orphan_video() {
        let mut session = GenerationSession::new();
        session.video = Some(EncodedAsset {
            path: PathBuf::from("/tmp/out.mp4"),
            container: "mp4".into(),
            byte_len: 1,
        });
        assert!(!session.invariant_holds());
    }

    #[test]
    fn test_reset_is_total_and_idempotent() {
        let mut session = populated();
        session.reset();
        assert!(!session.has_script());
        assert!(session.images.is_empty());
        assert!(session.audio.is_none());
        assert!(session.video.is_none());
        assert!(!session.is_generating);

        // Second reset on an empty session is fine
        session.reset();
        assert!(!session.has_script());
    }
}
