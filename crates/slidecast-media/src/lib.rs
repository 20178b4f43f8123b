//! Frame compositing and FFmpeg capture/encode.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building (multiple inputs, raw frames on stdin)
//! - FFprobe duration probing
//! - Encoder capability probing and format preference selection
//! - Letterbox/cross-fade frame compositing with a caption band
//! - The virtual-clock animation timeline
//! - The capture session binding frames and audio into one encoded file

pub mod capture;
pub mod command;
pub mod compositor;
pub mod encode;
pub mod error;
pub mod probe;
pub mod timeline;

pub use capture::{CaptureConfig, CaptureOutcome, CaptureSession, StopReason};
pub use command::FfmpegCommand;
pub use compositor::{placeholder_image, CaptionFont, FrameCompositor, PreparedSlide, Slide};
pub use encode::{select_format, EncoderSupport, VideoFormat};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use timeline::{Animation, FramePlan};
