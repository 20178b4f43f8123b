//! Shared data models for the slidecast generation pipeline.
//!
//! One generation run is represented by a [`GenerationSession`] populated
//! stage by stage (script, images, audio, video). Stage progress is tracked
//! with [`StageTracker`] and published as [`StageUpdate`] events.

pub mod asset;
pub mod session;
pub mod stage;

pub use asset::{AudioBundle, AudioSegment, EncodedAsset, ImageAsset};
pub use session::GenerationSession;
pub use stage::{Stage, StageStatus, StageTracker, StageUpdate, TransitionError};
