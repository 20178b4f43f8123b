//! Generated media assets accumulated during a session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single generated image, addressed by a stable re-fetchable URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Winning endpoint URL (re-fetchable locator)
    pub source_url: String,
    /// The sanitized prompt the image was generated from
    pub prompt: String,
    /// Display/playback position; batches are sorted ascending by index
    pub index: usize,
}

/// One independently fetched narration part.
///
/// `duration_secs` is only known after the downloaded media has been probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSegment {
    pub source_url: String,
    /// The narration text this segment voices
    pub text: String,
    pub duration_secs: f64,
    /// Playable handle: the fetched media file inside the session work dir
    pub path: PathBuf,
}

/// The full narration, split into exactly two back-to-back segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioBundle {
    pub parts: Vec<AudioSegment>,
    pub total_duration_secs: f64,
}

impl AudioBundle {
    /// Build a bundle from its ordered parts, summing probed durations.
    pub fn from_parts(parts: Vec<AudioSegment>) -> Self {
        let total_duration_secs = parts.iter().map(|p| p.duration_secs).sum();
        Self {
            parts,
            total_duration_secs,
        }
    }
}

/// The final encoded video file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedAsset {
    /// Encoded file inside the session work dir; deleted with it on reset
    pub path: PathBuf,
    /// Container extension ("mp4", "webm", "avi")
    pub container: String,
    pub byte_len: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_sums_durations() {
        let bundle = AudioBundle::from_parts(vec![
            AudioSegment {
                source_url: "http://a/1".into(),
                text: "First half.".into(),
                duration_secs: 29.5,
                path: PathBuf::from("/tmp/part1.mp3"),
            },
            AudioSegment {
                source_url: "http://a/2".into(),
                text: "Second half.".into(),
                duration_secs: 31.0,
                path: PathBuf::from("/tmp/part2.mp3"),
            },
        ]);
        assert_eq!(bundle.parts.len(), 2);
        assert!((bundle.total_duration_secs - 60.5).abs() < f64::EPSILON);
    }
}
