//! The pipeline controller.
//!
//! Owns the [`GenerationSession`] and exposes one operation per stage plus
//! `run_all` and `reset`. Stage methods check their preconditions before
//! touching any state, publish status transitions, and clear the advisory
//! `is_generating` flag on every exit path.

use std::path::{Path, PathBuf};

use slidecast_client::MediaClient;
use slidecast_media::{
    placeholder_image, select_format, CaptionFont, CaptureConfig, CaptureSession, EncoderSupport,
    FrameCompositor, Slide,
};
use slidecast_models::{EncodedAsset, GenerationSession, Stage, StageStatus, StageTracker};
use tempfile::TempDir;
use tracing::warn;

use crate::audio::load_audio_parts;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::images::{build_image_prompts, generate_image_batch, image_path};
use crate::logging::SessionLogger;
use crate::report::ProgressReporter;

/// Prompt template for script generation.
const SCRIPT_PROMPT: &str = "Create a detailed, engaging video script about \"{keywords}\". \
The script should be narrative-style, suitable for a 2-3 minute video. Include vivid \
descriptions and storytelling elements. Make it informative yet entertaining. Structure it \
with clear scenes that can be visualized.";

/// Requested durations past this point exceed what two ~31 second audio
/// segments can narrate.
const AUDIO_SPLIT_CAP_SECS: f64 = 62.0;

/// Drives one generation session through its four stages.
pub struct Controller {
    session: GenerationSession,
    tracker: StageTracker,
    config: PipelineConfig,
    client: MediaClient,
    reporter: ProgressReporter,
    work_dir: TempDir,
    keywords: String,
}

impl Controller {
    pub fn new(
        config: PipelineConfig,
        client: MediaClient,
        reporter: ProgressReporter,
    ) -> PipelineResult<Self> {
        Ok(Self {
            session: GenerationSession::new(),
            tracker: StageTracker::new(),
            config,
            client,
            reporter,
            work_dir: TempDir::new()?,
            keywords: String::new(),
        })
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.tracker.status(stage)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate the narration script from keyword input.
    pub async fn run_script(&mut self, keywords: &str) -> PipelineResult<()> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(PipelineError::precondition("enter keywords first"));
        }
        self.keywords = keywords.to_string();

        let logger = SessionLogger::new(&self.session.id, "script");
        logger.log_start(keywords);
        self.begin(Stage::Script, "Generating script...");

        let prompt = SCRIPT_PROMPT.replace("{keywords}", keywords);
        let result = self
            .client
            .generate_text(&prompt)
            .await
            .map_err(|e| PipelineError::script_failed(e.to_string()))
            .and_then(|script| {
                if script.trim().is_empty() {
                    Err(PipelineError::script_failed("empty script returned"))
                } else {
                    Ok(script)
                }
            });

        match self.settle(Stage::Script, result, "Script generated!") {
            Ok(script) => {
                logger.log_completion(&format!("{} chars", script.len()));
                self.session.script = script;
                Ok(())
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Generate the image batch from the script.
    pub async fn run_images(&mut self) -> PipelineResult<()> {
        if !self.session.has_script() {
            return Err(PipelineError::precondition("generate a script first"));
        }

        let logger = SessionLogger::new(&self.session.id, "images");
        self.begin(Stage::Image, "Generating images...");

        let prompts =
            build_image_prompts(&self.session.script, &self.keywords, self.config.image_count);
        let result = generate_image_batch(
            &self.client,
            &self.reporter,
            &self.config,
            &prompts,
            self.work_dir.path(),
        )
        .await;

        let message = match &result {
            Ok(assets) => format!("{} images generated!", assets.len()),
            Err(_) => String::new(),
        };
        match self.settle(Stage::Image, result, &message) {
            Ok(assets) => {
                logger.log_completion(&format!("{}/{} images", assets.len(), prompts.len()));
                self.session.images = assets;
                Ok(())
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Generate and load the two-part audio narration.
    pub async fn run_audio(&mut self) -> PipelineResult<()> {
        if !self.session.has_script() {
            return Err(PipelineError::precondition("generate a script first"));
        }
        if self.config.video_duration_secs > AUDIO_SPLIT_CAP_SECS {
            warn!(
                duration = self.config.video_duration_secs,
                "requested duration exceeds what the fixed two-part audio split can narrate"
            );
        }

        let logger = SessionLogger::new(&self.session.id, "audio");
        self.begin(Stage::Audio, "Generating audio narration...");

        let result = load_audio_parts(
            &self.client,
            &self.reporter,
            &self.config,
            &self.session.script,
            self.work_dir.path(),
        )
        .await;

        let message = match &result {
            Ok(bundle) => format!(
                "Audio generated ({:.0}s - split into {} parts)!",
                bundle.total_duration_secs,
                bundle.parts.len()
            ),
            Err(_) => String::new(),
        };
        match self.settle(Stage::Audio, result, &message) {
            Ok(bundle) => {
                logger.log_completion(&format!("{:.1}s total", bundle.total_duration_secs));
                self.session.audio = Some(bundle);
                Ok(())
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Composite and encode the final video.
    pub async fn run_video(&mut self) -> PipelineResult<()> {
        if !self.session.video_ready() {
            return Err(PipelineError::precondition(
                "generate script, images, and audio first",
            ));
        }

        let logger = SessionLogger::new(&self.session.id, "video");
        self.begin(
            Stage::Video,
            format!(
                "Creating {:.0}-second video...",
                self.config.video_duration_secs
            ),
        );

        let result = self.video_inner().await;
        let message = format!(
            "{:.0}-second video created!",
            self.config.video_duration_secs
        );
        match self.settle(Stage::Video, result, &message) {
            Ok(asset) => {
                logger.log_completion(&format!("{} bytes", asset.byte_len));
                self.session.video = Some(asset);
                Ok(())
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn video_inner(&mut self) -> PipelineResult<EncodedAsset> {
        // Fatal capability failure when no codec pair is available
        let support = EncoderSupport::probe().await?;
        let format = select_format(&support)?;

        let slides = self.load_slides().await?;
        let audio_parts: Vec<PathBuf> = self
            .session
            .audio
            .as_ref()
            .map(|bundle| bundle.parts.iter().map(|p| p.path.clone()).collect())
            .unwrap_or_default();

        let capture_config = CaptureConfig {
            width: self.config.image_width,
            height: self.config.image_height,
            fps: self.config.capture_fps,
            target_duration_secs: self.config.video_duration_secs,
            trailing_buffer_secs: 0.5,
        };
        let mut compositor = FrameCompositor::new(
            capture_config.width,
            capture_config.height,
            CaptionFont::discover(),
        );

        let video_dir = self.work_dir.path().join("video");
        tokio::fs::create_dir_all(&video_dir).await?;
        let output_path = video_dir.join(format!("slideshow.{}", format.container));

        let session = CaptureSession::new(capture_config, format);
        let outcome = session
            .record(&mut compositor, &slides, &audio_parts, &output_path)
            .await?;

        Ok(EncodedAsset {
            path: outcome.path,
            container: outcome.format.container.to_string(),
            byte_len: outcome.byte_len,
        })
    }

    /// Decode the stored image files, substituting a placeholder for
    /// anything that fails to decode.
    async fn load_slides(&self) -> PipelineResult<Vec<Slide>> {
        let images_dir = self.work_dir.path().join("images");
        let mut slides = Vec::with_capacity(self.session.images.len());

        for asset in &self.session.images {
            let path = image_path(&images_dir, asset.index);
            let image = match tokio::fs::read(&path).await {
                Ok(bytes) => match image::load_from_memory(&bytes) {
                    Ok(decoded) => decoded.to_rgb8(),
                    Err(e) => {
                        warn!(index = asset.index, "image decode failed: {e}");
                        placeholder_image(self.config.image_width, self.config.image_height)
                    }
                },
                Err(e) => {
                    warn!(index = asset.index, "image read failed: {e}");
                    placeholder_image(self.config.image_width, self.config.image_height)
                }
            };
            slides.push(Slide {
                image,
                caption: asset.prompt.clone(),
            });
        }

        Ok(slides)
    }

    /// Run all four stages sequentially, aborting on the first failure.
    pub async fn run_all(&mut self, keywords: &str) -> PipelineResult<()> {
        for stage in Stage::ALL {
            self.publish(stage, StageStatus::Waiting, "Waiting...", 0);
        }
        self.run_script(keywords).await?;
        self.run_images().await?;
        self.run_audio().await?;
        self.run_video().await?;
        Ok(())
    }

    /// Replace the script text manually (keeps downstream stages intact).
    pub fn set_script(&mut self, text: &str) {
        self.session.script = text.to_string();
    }

    /// Discard the whole session and its on-disk resources.
    ///
    /// Idempotent and total: every stage returns to `Waiting` and all
    /// intermediate binaries are released with the work directory.
    pub fn reset(&mut self) -> PipelineResult<()> {
        self.session.reset();
        self.tracker.reset();
        self.keywords.clear();
        // Dropping the old TempDir deletes fetched audio, images and video
        self.work_dir = TempDir::new()?;
        for stage in Stage::ALL {
            self.publish(stage, StageStatus::Waiting, "Waiting...", 0);
        }
        Ok(())
    }

    /// Copy the encoded video out under a timestamped filename.
    pub async fn export_video(&self, dest_dir: &Path) -> PipelineResult<PathBuf> {
        let video = self
            .session
            .video
            .as_ref()
            .ok_or_else(|| PipelineError::precondition("no video available for download"))?;

        let filename = format!(
            "ai-generated-video-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            video.container
        );
        let dest = dest_dir.join(filename);
        tokio::fs::copy(&video.path, &dest).await?;
        Ok(dest)
    }

    /// Mark a stage as running. The advisory flag stays set until the
    /// stage settles.
    fn begin(&mut self, stage: Stage, message: impl Into<String>) {
        self.session.is_generating = true;
        self.publish(stage, StageStatus::Processing, message, 0);
    }

    /// Settle a stage from its result, clearing `is_generating` on both
    /// paths before the outcome propagates.
    fn settle<T>(
        &mut self,
        stage: Stage,
        result: PipelineResult<T>,
        ok_message: &str,
    ) -> PipelineResult<T> {
        self.session.is_generating = false;
        match result {
            Ok(value) => {
                self.publish(stage, StageStatus::Completed, ok_message, 100);
                Ok(value)
            }
            Err(e) => {
                self.publish(
                    stage,
                    StageStatus::Error,
                    format!("{stage} generation failed: {e}"),
                    0,
                );
                Err(e)
            }
        }
    }

    fn publish(&mut self, stage: Stage, status: StageStatus, message: impl Into<String>, progress: u8) {
        if let Err(e) = self.tracker.transition(stage, status) {
            // Transitions are driven by the stage methods themselves, so a
            // rejected one is a controller bug
            debug_assert!(false, "{e}");
            warn!("{e}");
            return;
        }
        self.reporter
            .publish(stage, status, message, progress);
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("session", &self.session.id)
            .field("is_generating", &self.session.is_generating)
            .finish()
    }
}
