//! The capture/encode session.
//!
//! Binds the compositor's frame output and the narration audio into a
//! single FFmpeg child: raw RGB frames at the capture rate on stdin, the
//! audio segment files concatenated back-to-back, one encoded file out.
//!
//! Two stop conditions race: the animation finishing (plus a short trailing
//! buffer so the last frame is not cut) and the hard stop at the target
//! duration. Whichever fires first wins, and capture stops exactly once.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::compositor::{FrameCompositor, PreparedSlide, Slide};
use crate::encode::VideoFormat;
use crate::error::{MediaError, MediaResult};
use crate::timeline::Animation;

/// Capture parameters.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    /// Encode/capture frame rate, independent of the 60 Hz render cadence
    pub fps: u32,
    /// Target video duration in seconds
    pub target_duration_secs: f64,
    /// Extra capture time after the animation completes
    pub trailing_buffer_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            target_duration_secs: 60.0,
            trailing_buffer_secs: 0.5,
        }
    }
}

/// Which stop condition won the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All images were shown; stopped after the trailing buffer
    AnimationComplete,
    /// Hard stop at the target duration
    DurationElapsed,
}

/// Result of a completed capture.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub path: PathBuf,
    pub format: VideoFormat,
    pub frames_written: u64,
    pub captured_secs: f64,
    pub stop_reason: StopReason,
    pub byte_len: u64,
}

/// One recording session over a slide deck and up to two audio parts.
pub struct CaptureSession {
    config: CaptureConfig,
    format: VideoFormat,
}

impl CaptureSession {
    pub fn new(config: CaptureConfig, format: VideoFormat) -> Self {
        Self { config, format }
    }

    /// Record the slideshow into `output_path`.
    ///
    /// Audio parts play back-to-back with no gap (FFmpeg `concat` audio
    /// filter); the audio track is capped at the longest possible capture
    /// time so a long narration cannot outrun the video.
    pub async fn record(
        &self,
        compositor: &mut FrameCompositor,
        slides: &[Slide],
        audio_parts: &[PathBuf],
        output_path: &Path,
    ) -> MediaResult<CaptureOutcome> {
        if slides.is_empty() {
            return Err(MediaError::NoSlides);
        }

        let config = &self.config;
        let max_capture_secs = config.target_duration_secs + config.trailing_buffer_secs;

        let mut command = FfmpegCommand::new(output_path)
            .stdin_input([
                "-f".to_string(),
                "rawvideo".to_string(),
                "-pix_fmt".to_string(),
                "rgb24".to_string(),
                "-s".to_string(),
                format!("{}x{}", config.width, config.height),
                "-r".to_string(),
                config.fps.to_string(),
            ]);
        for part in audio_parts {
            command = command.input_file(part);
        }
        command = match audio_parts.len() {
            0 => command.map("0:v"),
            1 => command.map("0:v").map("1:a"),
            n => {
                let joins: String = (1..=n).map(|i| format!("[{i}:a]")).collect();
                command
                    .filter_complex(format!("{joins}concat=n={n}:v=0:a=1[aud]"))
                    .map("0:v")
                    .map("[aud]")
            }
        };
        command = command
            .video_codec(self.format.video_codec)
            .pixel_format("yuv420p")
            .duration(max_capture_secs);
        if !audio_parts.is_empty() {
            command = command.audio_codec(self.format.audio_codec);
        }

        let mut child = command.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stdin not piped", None, None))?;

        let prepared: Vec<PreparedSlide> = slides.iter().map(|s| compositor.prepare(s)).collect();
        let mut animation = Animation::new(slides.len(), config.target_duration_secs);
        info!(
            slides = slides.len(),
            per_image_secs = animation.per_image_secs(),
            "capture started"
        );

        let frame_interval = 1.0 / config.fps as f64;
        let mut frames_written: u64 = 0;
        let mut finish_deadline: Option<f64> = None;
        // Set exactly once; guards against the two stop conditions both firing
        let mut stop: Option<StopReason> = None;

        while stop.is_none() {
            let t = frames_written as f64 * frame_interval;

            if t >= config.target_duration_secs {
                stop = Some(StopReason::DurationElapsed);
                break;
            }

            let plan = animation.advance_to(t);
            if plan.finished && finish_deadline.is_none() {
                finish_deadline = Some(t + config.trailing_buffer_secs);
                debug!(at = t, "animation complete; trailing buffer started");
            }
            if let Some(deadline) = finish_deadline {
                if t >= deadline {
                    stop = Some(StopReason::AnimationComplete);
                    break;
                }
            }

            let incoming = plan
                .incoming
                .map(|(index, progress)| (&prepared[index], progress));
            let frame = compositor.render(&prepared[plan.base_index], incoming);
            stdin.write_all(frame.as_raw()).await?;
            frames_written += 1;
        }

        // Closing stdin ends the video stream and finalizes the encode
        stdin.shutdown().await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(MediaError::ffmpeg_failed(
                "encode failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ));
        }

        let byte_len = tokio::fs::metadata(output_path).await?.len();
        let captured_secs = frames_written as f64 * frame_interval;
        let stop_reason = stop.expect("loop exits only with a stop reason");
        info!(
            frames = frames_written,
            secs = captured_secs,
            ?stop_reason,
            "capture finished"
        );

        Ok(CaptureOutcome {
            path: output_path.to_path_buf(),
            format: self.format,
            frames_written,
            captured_secs,
            stop_reason,
            byte_len,
        })
    }
}
