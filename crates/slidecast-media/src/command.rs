//! FFmpeg command builder.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Where one FFmpeg input comes from.
#[derive(Debug, Clone)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone)]
struct InputSpec {
    /// Arguments placed before this input's `-i`
    args: Vec<String>,
    source: InputSource,
}

/// Builder for FFmpeg invocations with any number of inputs.
///
/// Input order matters: stream specifiers in `-map`/`-filter_complex`
/// reference inputs by position.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<InputSpec>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a file input.
    pub fn input_file(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(InputSpec {
            args: Vec::new(),
            source: InputSource::File(path.as_ref().to_path_buf()),
        });
        self
    }

    /// Add a stdin input with per-input arguments (demuxer, pixel format, ...).
    pub fn stdin_input<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(InputSpec {
            args: args.into_iter().map(Into::into).collect(),
            source: InputSource::Stdin,
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set output pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Cap output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{seconds:.3}"))
    }

    /// Assemble the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
        ];
        if self.overwrite {
            args.push("-y".to_string());
        }
        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            match &input.source {
                InputSource::File(path) => args.push(path.display().to_string()),
                InputSource::Stdin => args.push("-".to_string()),
            }
        }
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.display().to_string());
        args
    }

    fn has_stdin_input(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| matches!(i.source, InputSource::Stdin))
    }

    /// Spawn the FFmpeg child process.
    ///
    /// stdin is piped when a stdin input was declared; stderr is always
    /// captured for failure reporting.
    pub fn spawn(&self) -> MediaResult<Child> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = self.build_args();
        debug!("ffmpeg {}", args.join(" "));

        let stdin = if self.has_stdin_input() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_order() {
        let cmd = FfmpegCommand::new("/tmp/out.mp4")
            .stdin_input(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .input_file("/tmp/part1.mp3")
            .input_file("/tmp/part2.mp3")
            .filter_complex("[1:a][2:a]concat=n=2:v=0:a=1[aud]")
            .map("0:v")
            .map("[aud]")
            .video_codec("libx264");

        let args = cmd.build_args();
        let joined = args.join(" ");

        // stdin input precedes file inputs; its per-input args precede its -i
        let stdin_pos = joined.find("-f rawvideo -pix_fmt rgb24 -i -").unwrap();
        let part1_pos = joined.find("-i /tmp/part1.mp3").unwrap();
        let part2_pos = joined.find("-i /tmp/part2.mp3").unwrap();
        assert!(stdin_pos < part1_pos && part1_pos < part2_pos);

        // Output path is last
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
        assert!(joined.contains("-c:v libx264"));
    }

    #[test]
    fn test_overwrite_and_loglevel_defaults() {
        let args = FfmpegCommand::new("/tmp/out.webm").build_args();
        assert!(args.contains(&"-y".to_string()));
        assert!(args.contains(&"-loglevel".to_string()));
        assert!(args.contains(&"error".to_string()));
    }
}
