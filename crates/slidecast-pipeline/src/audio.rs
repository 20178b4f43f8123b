//! Narration splitting and audio segment loading.
//!
//! The narration is always split into exactly two parts at the sentence
//! boundary nearest the midpoint (upstream audio requests cap out near 31
//! seconds per call). Parts are fetched sequentially, each with bounded
//! retries, and probed for duration once on disk.

use std::path::Path;

use regex::Regex;
use slidecast_client::MediaClient;
use slidecast_models::{AudioBundle, AudioSegment, Stage, StageStatus};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::report::ProgressReporter;
use crate::retry::{retry_async, RetryConfig};

/// Byte offset to split the narration at: the sentence-terminal
/// punctuation (followed by whitespace) closest to the midpoint, keeping
/// the punctuation with the first part. Falls back to the midpoint itself
/// (aligned to a char boundary) when no boundary exists.
pub fn split_index(text: &str) -> usize {
    let midpoint = text.len() / 2;
    let boundary_re = Regex::new(r"[.!?]\s").expect("valid regex");

    let closest = boundary_re
        .find_iter(text)
        .map(|m| m.start() + 1)
        .min_by_key(|&idx| idx.abs_diff(midpoint));

    match closest {
        Some(idx) => idx,
        None => {
            // Align the raw midpoint to a char boundary
            let mut idx = midpoint;
            while idx < text.len() && !text.is_char_boundary(idx) {
                idx += 1;
            }
            idx
        }
    }
}

/// Split the narration into its two trimmed parts.
pub fn split_narration(text: &str) -> (String, String) {
    let idx = split_index(text);
    let (first, second) = text.split_at(idx);
    (first.trim().to_string(), second.trim().to_string())
}

/// Fetch, store and probe both narration segments sequentially.
///
/// Part 2 is only attempted after part 1 has succeeded; exhausting the
/// retries on either part fails the stage with the last error.
pub async fn load_audio_parts(
    client: &MediaClient,
    reporter: &ProgressReporter,
    config: &PipelineConfig,
    script: &str,
    work_dir: &Path,
) -> PipelineResult<AudioBundle> {
    let (part1, part2) = split_narration(script);
    debug!(
        part1_len = part1.len(),
        part2_len = part2.len(),
        "narration split"
    );

    let audio_dir = work_dir.join("audio");
    tokio::fs::create_dir_all(&audio_dir).await?;

    let mut segments = Vec::with_capacity(2);
    for (part_no, text) in [(1u32, part1), (2u32, part2)] {
        let segment = load_segment(client, reporter, config, part_no, &text, &audio_dir).await?;
        info!(
            part = part_no,
            duration = segment.duration_secs,
            "audio segment loaded"
        );
        segments.push(segment);
    }

    Ok(AudioBundle::from_parts(segments))
}

async fn load_segment(
    client: &MediaClient,
    reporter: &ProgressReporter,
    config: &PipelineConfig,
    part_no: u32,
    text: &str,
    audio_dir: &Path,
) -> PipelineResult<AudioSegment> {
    let retry = RetryConfig::new(format!("audio part {part_no}"))
        .with_max_attempts(config.audio_max_attempts)
        .with_base_delay(config.audio_backoff_base)
        .with_attempt_timeout(config.audio_attempt_timeout);
    let path = audio_dir.join(format!("part_{part_no}.mp3"));

    retry_async(&retry, |attempt| {
        let path = path.clone();
        async move {
            if attempt > 1 {
                reporter.publish(
                    Stage::Audio,
                    StageStatus::Processing,
                    format!(
                        "Retrying part {part_no} audio generation (attempt {attempt}/{})...",
                        config.audio_max_attempts
                    ),
                    0,
                );
            }

            let media = client
                .generate_audio(text, &config.voice)
                .await
                .map_err(|e| PipelineError::audio_failed(e.to_string()))?;
            tokio::fs::write(&path, &media.bytes).await?;

            let duration_secs = slidecast_media::probe_duration(&path).await?;
            Ok::<_, PipelineError>(AudioSegment {
                source_url: media.source_url,
                text: text.to_string(),
                duration_secs,
                path,
            })
        }
    })
    .await
}
