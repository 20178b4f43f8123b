//! Encoder capability probing and format selection.
//!
//! The output format is picked opportunistically from whatever the local
//! FFmpeg build supports, probing the encoder list once per capture and
//! walking a fixed preference ladder.

use std::collections::HashSet;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// One (video codec, audio codec, container) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub video_codec: &'static str,
    pub audio_codec: &'static str,
    /// Container extension without the dot
    pub container: &'static str,
}

/// Preference ladder: best-supported pair first, generic last.
const PREFERENCE: [VideoFormat; 3] = [
    VideoFormat {
        video_codec: "libx264",
        audio_codec: "aac",
        container: "mp4",
    },
    VideoFormat {
        video_codec: "libvpx-vp9",
        audio_codec: "libopus",
        container: "webm",
    },
    VideoFormat {
        video_codec: "mpeg4",
        audio_codec: "mp2",
        container: "avi",
    },
];

/// The set of encoder names the local FFmpeg build advertises.
#[derive(Debug, Clone)]
pub struct EncoderSupport {
    names: HashSet<String>,
}

impl EncoderSupport {
    /// Probe `ffmpeg -encoders` once.
    pub async fn probe() -> MediaResult<Self> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ffmpeg_failed(
                "encoder probe failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ));
        }

        Ok(Self::parse(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Parse the `-encoders` listing: flag column, then the encoder name.
    fn parse(listing: &str) -> Self {
        let mut names = HashSet::new();
        let mut in_body = false;
        for line in listing.lines() {
            if !in_body {
                in_body = line.contains("------");
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(_flags), Some(name)) = (parts.next(), parts.next()) else {
                continue;
            };
            names.insert(name.to_string());
        }
        Self { names }
    }

    /// Build from explicit encoder names (tests, overrides).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports(&self, encoder: &str) -> bool {
        self.names.contains(encoder)
    }
}

/// Select the first fully supported format in preference order.
///
/// No supported pair is a fatal capability failure, not retryable.
pub fn select_format(support: &EncoderSupport) -> MediaResult<VideoFormat> {
    for format in PREFERENCE {
        if support.supports(format.video_codec) && support.supports(format.audio_codec) {
            info!(
                video = format.video_codec,
                audio = format.audio_codec,
                container = format.container,
                "selected encode format"
            );
            return Ok(format);
        }
    }
    Err(MediaError::NoSupportedFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_h264_aac() {
        let support = EncoderSupport::from_names(["libx264", "aac", "libvpx-vp9", "libopus"]);
        let format = select_format(&support).unwrap();
        assert_eq!(format.video_codec, "libx264");
        assert_eq!(format.container, "mp4");
    }

    #[test]
    fn test_falls_back_down_the_ladder() {
        let support = EncoderSupport::from_names(["libvpx-vp9", "libopus", "mpeg4", "mp2"]);
        let format = select_format(&support).unwrap();
        assert_eq!(format.video_codec, "libvpx-vp9");
        assert_eq!(format.container, "webm");

        let support = EncoderSupport::from_names(["mpeg4", "mp2"]);
        let format = select_format(&support).unwrap();
        assert_eq!(format.container, "avi");
    }

    #[test]
    fn test_partial_pair_does_not_count() {
        // Video codec present but its audio partner missing
        let support = EncoderSupport::from_names(["libx264", "mpeg4", "mp2"]);
        let format = select_format(&support).unwrap();
        assert_eq!(format.video_codec, "mpeg4");
    }

    #[test]
    fn test_no_support_is_fatal() {
        let support = EncoderSupport::from_names(Vec::<String>::new());
        let err = select_format(&support).unwrap_err();
        assert!(matches!(err, MediaError::NoSupportedFormat));
        assert!(err.is_fatal_capability());
    }

    #[test]
    fn test_parse_encoder_listing() {
        let listing = "\
Encoders:
 V..... = Video
 ------
 V....D libx264              H.264 / AVC
 A....D aac                  AAC (Advanced Audio Coding)
";
        let support = EncoderSupport::parse(listing);
        assert!(support.supports("libx264"));
        assert!(support.supports("aac"));
        assert!(!support.supports("libvpx-vp9"));
    }
}
