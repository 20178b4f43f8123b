//! The slidecast generation pipeline.
//!
//! A four-stage state machine (script, images, audio, video) over one
//! [`slidecast_models::GenerationSession`], with per-stage status tracking,
//! bounded retries, partial-failure tolerance and progress publishing.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod images;
pub mod logging;
pub mod report;
pub mod retry;

pub use config::PipelineConfig;
pub use controller::Controller;
pub use error::{PipelineError, PipelineResult};
pub use report::ProgressReporter;
