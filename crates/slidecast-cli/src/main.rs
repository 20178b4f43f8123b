//! Slidecast binary: prompt in, narrated slideshow video out.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slidecast_client::{ApiConfig, FetchStrategy, MediaClient, QualityTier};
use slidecast_models::StageStatus;
use slidecast_pipeline::{Controller, PipelineConfig, ProgressReporter};

#[derive(Parser, Debug)]
#[command(name = "slidecast", about = "Generate a narrated slideshow video from keywords")]
struct Args {
    /// Topic keywords the video is about
    keywords: String,

    /// Number of images to generate
    #[arg(long, default_value_t = 4)]
    images: usize,

    /// Image and video frame size, WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    size: String,

    /// Image quality tier (high or standard)
    #[arg(long, default_value = "high")]
    quality: QualityTier,

    /// Narration voice
    #[arg(long, default_value = "nova")]
    voice: String,

    /// Target video duration in seconds
    #[arg(long, default_value_t = 60.0)]
    duration: f64,

    /// Capture frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory the final video is exported into
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Route API requests through a forwarding proxy at this base URL
    #[arg(long)]
    proxy: Option<String>,
}

fn parse_size(size: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = size
        .split_once('x')
        .with_context(|| format!("invalid --size {size:?}, expected WIDTHxHEIGHT"))?;
    Ok((w.parse()?, h.parse()?))
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slidecast=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let (width, height) = parse_size(&args.size)?;

    let mut api = ApiConfig::from_env();
    if let Some(base) = args.proxy.clone() {
        api.strategy = FetchStrategy::Proxy { base };
    }

    let config = PipelineConfig {
        image_count: args.images,
        image_width: width,
        image_height: height,
        quality: args.quality,
        voice: args.voice.clone(),
        video_duration_secs: args.duration,
        capture_fps: args.fps,
        ..PipelineConfig::default()
    };

    let (reporter, mut updates) = ProgressReporter::channel();
    // Render stage updates as they arrive
    let renderer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update.status {
                StageStatus::Error => {
                    error!("[{}] {}", update.stage, update.message)
                }
                _ => info!(
                    "[{}] {} ({}%)",
                    update.stage, update.message, update.progress
                ),
            }
        }
    });

    let client = MediaClient::new(api);
    let mut controller = Controller::new(config, client, reporter)?;

    info!("Generating video for: {}", args.keywords);
    if let Err(e) = controller.run_all(&args.keywords).await {
        // Give the renderer a chance to drain the error update
        drop(controller);
        renderer.await.ok();
        bail!("generation failed: {e}");
    }

    let session = controller.session();
    info!(
        "Generated {} images and {:.1}s of narration",
        session.images.len(),
        session
            .audio
            .as_ref()
            .map(|a| a.total_duration_secs)
            .unwrap_or(0.0)
    );

    let exported = controller
        .export_video(&args.output)
        .await
        .context("failed to export video")?;
    info!("Video saved to {}", exported.display());

    drop(controller);
    renderer.await.ok();
    Ok(())
}
