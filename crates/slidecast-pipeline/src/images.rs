//! Image prompt derivation and batch generation.

use std::path::{Path, PathBuf};

use slidecast_client::{ImageRequest, MediaClient};
use slidecast_models::{ImageAsset, Stage, StageStatus};
use tracing::warn;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::report::ProgressReporter;

/// Perspective variants used once the script runs out of sentences.
const PERSPECTIVES: [&str; 5] = [
    "wide angle perspective",
    "intimate close-up view",
    "aerial panoramic view",
    "golden hour atmosphere",
    "detailed macro perspective",
];

/// Style suffixes cycled across the whole batch.
const STYLES: [&str; 5] = [
    "cinematic composition, dramatic lighting, high detail",
    "artistic masterpiece, vibrant colors, professional photography",
    "stunning visual, photorealistic, award-winning composition",
    "breathtaking scene, perfect lighting, ultra-detailed",
    "magnificent view, rich textures, cinematic quality",
];

/// Minimum trimmed length for a script sentence to become a prompt.
const MIN_SENTENCE_LEN: usize = 10;

/// Derive `count` image prompts from the script, topping up with keyword
/// + perspective variants and appending a cycling style suffix to all.
pub fn build_image_prompts(script: &str, keywords: &str, count: usize) -> Vec<String> {
    let sentences: Vec<&str> = script
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.len() > MIN_SENTENCE_LEN)
        .collect();

    (0..count)
        .map(|i| {
            let base = match sentences.get(i) {
                Some(sentence) => sentence.to_string(),
                None => format!("{keywords}, {}", PERSPECTIVES[i % PERSPECTIVES.len()]),
            };
            format!("{base}, {}", STYLES[i % STYLES.len()])
        })
        .collect()
}

/// The per-index file the fetched image bytes are stored under.
pub fn image_path(images_dir: &Path, index: usize) -> PathBuf {
    images_dir.join(format!("img_{index:03}.img"))
}

/// Generate the batch sequentially, one request at a time.
///
/// Individual failures are logged and tolerated; the batch fails only when
/// nothing succeeded. Results come back sorted ascending by index.
pub async fn generate_image_batch(
    client: &MediaClient,
    reporter: &ProgressReporter,
    config: &PipelineConfig,
    prompts: &[String],
    work_dir: &Path,
) -> PipelineResult<Vec<ImageAsset>> {
    let images_dir = work_dir.join("images");
    tokio::fs::create_dir_all(&images_dir).await?;

    let total = prompts.len();
    let mut assets = Vec::new();

    for (index, prompt) in prompts.iter().enumerate() {
        let progress = (((index + 1) * 100) / total) as u8;
        reporter.publish(
            Stage::Image,
            StageStatus::Processing,
            format!("Generating image {}/{total}...", index + 1),
            progress,
        );

        let request = ImageRequest {
            prompt: prompt.clone(),
            width: config.image_width,
            height: config.image_height,
            seed: index as u64,
            quality: config.quality,
        };

        match client.generate_image(&request).await {
            Ok(media) => {
                tokio::fs::write(image_path(&images_dir, index), &media.bytes).await?;
                assets.push(ImageAsset {
                    source_url: media.source_url,
                    prompt: prompt.clone(),
                    index,
                });
            }
            Err(e) => {
                warn!(image = index + 1, "image generation failed: {e}");
            }
        }

        // Fixed delay between requests to avoid upstream throttling
        tokio::time::sleep(config.inter_image_delay).await;
    }

    if assets.is_empty() {
        return Err(PipelineError::image_failed(
            "no images were generated successfully",
        ));
    }

    assets.sort_by_key(|a| a.index);
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "The sun rises over the jagged peaks. Morning light floods the valley below. Fog.";

    #[test]
    fn test_prompts_use_script_sentences_first() {
        let prompts = build_image_prompts(SCRIPT, "mountains", 2);
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("The sun rises over the jagged peaks"));
        assert!(prompts[1].starts_with("Morning light floods the valley below"));
    }

    #[test]
    fn test_short_sentences_are_skipped() {
        // "Fog" is under the length threshold and never becomes a prompt
        let prompts = build_image_prompts(SCRIPT, "mountains", 3);
        assert!(prompts[2].starts_with("mountains, aerial panoramic view"));
    }

    #[test]
    fn test_variants_cycle_beyond_sentence_count() {
        let prompts = build_image_prompts("", "sunset", 7);
        assert!(prompts[0].contains("wide angle perspective"));
        assert!(prompts[4].contains("detailed macro perspective"));
        // Sixth prompt wraps back to the first perspective
        assert!(prompts[5].contains("wide angle perspective"));
    }

    #[test]
    fn test_style_suffix_cycles_across_batch() {
        let prompts = build_image_prompts("", "sunset", 6);
        assert!(prompts[0].ends_with(STYLES[0]));
        assert!(prompts[1].ends_with(STYLES[1]));
        assert!(prompts[5].ends_with(STYLES[0]));
    }

    #[test]
    fn test_every_prompt_gets_a_style() {
        for prompt in build_image_prompts(SCRIPT, "mountains", 5) {
            assert!(STYLES.iter().any(|s| prompt.ends_with(s)), "{prompt}");
        }
    }
}
