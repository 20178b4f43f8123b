//! Pipeline stage identifiers and status tracking.
//!
//! Each of the four stages carries an independent status that moves through
//! a fixed transition table: `Waiting -> Processing -> {Completed, Error}`.
//! A completed or failed stage may be re-run (back to `Processing`), and a
//! reset returns every stage to `Waiting`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Script,
    Image,
    Audio,
    Video,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Script, Stage::Image, Stage::Audio, Stage::Video];

    /// Get string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Image => "image",
            Stage::Audio => "audio",
            Stage::Video => "video",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-stage processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started yet
    #[default]
    Waiting,
    /// Stage is actively running
    Processing,
    /// Stage finished successfully
    Completed,
    /// Stage failed with an error
    Error,
}

impl StageStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Waiting => "waiting",
            StageStatus::Processing => "processing",
            StageStatus::Completed => "completed",
            StageStatus::Error => "error",
        }
    }

    /// Check if this is a settled state (no run in flight).
    pub fn is_settled(&self) -> bool {
        !matches!(self, StageStatus::Processing)
    }

    /// Whether the transition `self -> next` is allowed.
    ///
    /// `Waiting` only starts; a run in flight only settles; settled stages
    /// may start again (re-run). Any state may return to `Waiting` via
    /// reset.
    pub fn can_transition_to(&self, next: StageStatus) -> bool {
        match (self, next) {
            (_, StageStatus::Waiting) => true,
            (StageStatus::Waiting, StageStatus::Processing) => true,
            (StageStatus::Processing, StageStatus::Completed | StageStatus::Error) => true,
            (StageStatus::Completed | StageStatus::Error, StageStatus::Processing) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected stage status transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {stage} status transition: {from} -> {to}")]
pub struct TransitionError {
    pub stage: Stage,
    pub from: StageStatus,
    pub to: StageStatus,
}

/// A single status/progress event published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageUpdate {
    pub stage: Stage,
    pub status: StageStatus,
    /// Human-readable progress message
    pub message: String,
    /// Progress percentage (0-100)
    pub progress: u8,
}

impl StageUpdate {
    pub fn new(stage: Stage, status: StageStatus, message: impl Into<String>, progress: u8) -> Self {
        Self {
            stage,
            status,
            message: message.into(),
            progress: progress.min(100),
        }
    }
}

/// Validated per-stage status table.
///
/// Purely observational state consumed by the presentation layer; not
/// persisted anywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTracker {
    script: StageStatus,
    image: StageStatus,
    audio: StageStatus,
    video: StageStatus,
}

impl StageTracker {
    /// Create a tracker with every stage `Waiting`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of a stage.
    pub fn status(&self, stage: Stage) -> StageStatus {
        match stage {
            Stage::Script => self.script,
            Stage::Image => self.image,
            Stage::Audio => self.audio,
            Stage::Video => self.video,
        }
    }

    /// Apply a transition, rejecting moves outside the transition table.
    pub fn transition(&mut self, stage: Stage, to: StageStatus) -> Result<(), TransitionError> {
        let from = self.status(stage);
        if !from.can_transition_to(to) {
            return Err(TransitionError { stage, from, to });
        }
        let slot = match stage {
            Stage::Script => &mut self.script,
            Stage::Image => &mut self.image,
            Stage::Audio => &mut self.audio,
            Stage::Video => &mut self.video,
        };
        *slot = to;
        Ok(())
    }

    /// Return every stage to `Waiting`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when all four stages completed.
    pub fn all_completed(&self) -> bool {
        Stage::ALL
            .iter()
            .all(|s| self.status(*s) == StageStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transition_table() {
        let s = StageStatus::Waiting;
        assert!(s.can_transition_to(StageStatus::Processing));
        assert!(!s.can_transition_to(StageStatus::Completed));
        assert!(!s.can_transition_to(StageStatus::Error));

        let s = StageStatus::Processing;
        assert!(s.can_transition_to(StageStatus::Completed));
        assert!(s.can_transition_to(StageStatus::Error));
        assert!(!s.can_transition_to(StageStatus::Processing));

        // Settled stages can be re-run
        assert!(StageStatus::Completed.can_transition_to(StageStatus::Processing));
        assert!(StageStatus::Error.can_transition_to(StageStatus::Processing));

        // Reset is always allowed
        for s in [
            StageStatus::Waiting,
            StageStatus::Processing,
            StageStatus::Completed,
            StageStatus::Error,
        ] {
            assert!(s.can_transition_to(StageStatus::Waiting));
        }
    }

    #[test]
    fn test_tracker_rejects_skipped_states() {
        let mut tracker = StageTracker::new();
        let err = tracker
            .transition(Stage::Script, StageStatus::Completed)
            .unwrap_err();
        assert_eq!(err.from, StageStatus::Waiting);
        assert_eq!(err.to, StageStatus::Completed);
        // Status unchanged after a rejected transition
        assert_eq!(tracker.status(Stage::Script), StageStatus::Waiting);
    }

    #[test]
    fn test_tracker_full_lifecycle() {
        let mut tracker = StageTracker::new();
        for stage in Stage::ALL {
            tracker.transition(stage, StageStatus::Processing).unwrap();
            tracker.transition(stage, StageStatus::Completed).unwrap();
        }
        assert!(tracker.all_completed());

        tracker.reset();
        for stage in Stage::ALL {
            assert_eq!(tracker.status(stage), StageStatus::Waiting);
        }
    }

    #[test]
    fn test_stage_serialization() {
        let update = StageUpdate::new(Stage::Image, StageStatus::Processing, "Generating", 50);
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"stage\":\"image\""));
        assert!(json.contains("\"status\":\"processing\""));
    }

    #[test]
    fn test_progress_clamped() {
        let update = StageUpdate::new(Stage::Video, StageStatus::Completed, "done", 150);
        assert_eq!(update.progress, 100);
    }
}
