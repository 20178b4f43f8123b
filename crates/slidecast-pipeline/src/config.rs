//! Pipeline configuration.

use std::time::Duration;

use slidecast_client::QualityTier;

/// Knobs for one generation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of images to generate
    pub image_count: usize,
    /// Generated image / video frame width
    pub image_width: u32,
    /// Generated image / video frame height
    pub image_height: u32,
    /// Image quality tier
    pub quality: QualityTier,
    /// Narration voice identifier
    pub voice: String,
    /// Target video duration in seconds
    pub video_duration_secs: f64,
    /// Capture/encode frame rate
    pub capture_fps: u32,
    /// Delay between image requests (upstream throttle avoidance)
    pub inter_image_delay: Duration,
    /// Audio load attempts per segment, including the first
    pub audio_max_attempts: u32,
    /// Per-attempt bound for one audio segment load
    pub audio_attempt_timeout: Duration,
    /// Backoff unit for audio retries (delay doubles per failure)
    pub audio_backoff_base: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_count: 4,
            image_width: 1280,
            image_height: 720,
            quality: QualityTier::High,
            voice: "nova".to_string(),
            video_duration_secs: 60.0,
            capture_fps: 30,
            inter_image_delay: Duration::from_secs(1),
            audio_max_attempts: 3,
            audio_attempt_timeout: Duration::from_secs(30),
            audio_backoff_base: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, keeping defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            image_count: env_parse("SLIDECAST_IMAGE_COUNT", defaults.image_count),
            image_width: env_parse("SLIDECAST_IMAGE_WIDTH", defaults.image_width),
            image_height: env_parse("SLIDECAST_IMAGE_HEIGHT", defaults.image_height),
            voice: std::env::var("SLIDECAST_VOICE").unwrap_or(defaults.voice),
            video_duration_secs: env_parse("SLIDECAST_DURATION_SECS", defaults.video_duration_secs),
            capture_fps: env_parse("SLIDECAST_CAPTURE_FPS", defaults.capture_fps),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_settings() {
        let config = PipelineConfig::default();
        assert_eq!(config.image_count, 4);
        assert_eq!(config.audio_max_attempts, 3);
        assert_eq!(config.audio_attempt_timeout, Duration::from_secs(30));
        assert_eq!(config.inter_image_delay, Duration::from_secs(1));
        assert_eq!(config.voice, "nova");
    }
}
