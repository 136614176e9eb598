//! Thin builder around the ffmpeg CLI.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

// ffmpeg prints the actual error at the end of stderr.
const STDERR_TAIL: usize = 300;

/// One ffmpeg invocation: a primary input, optional secondary inputs
/// (BGM tracks), output-side arguments, and the output path. Always
/// overwrites and runs at `-v error`.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    extra_inputs: Vec<PathBuf>,
    output_args: Vec<String>,
    output: PathBuf,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            extra_inputs: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Add a secondary input, placed after the primary `-i`.
    pub fn extra_input(mut self, path: impl AsRef<Path>) -> Self {
        self.extra_inputs.push(path.as_ref().to_path_buf());
        self
    }

    fn arg(mut self, value: impl Into<String>) -> Self {
        self.output_args.push(value.into());
        self
    }

    fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.flag("-vf", filter)
    }

    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.flag("-filter_complex", filter)
    }

    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.flag("-af", filter)
    }

    pub fn map(self, stream: impl Into<String>) -> Self {
        self.flag("-map", stream)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.flag("-c:v", codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.flag("-c:a", codec)
    }

    /// Stop writing at the end of the shortest input.
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-v".into(), "error".into()];
        args.push("-i".into());
        args.push(self.input.to_string_lossy().into_owned());
        for extra in &self.extra_inputs {
            args.push("-i".into());
            args.push(extra.to_string_lossy().into_owned());
        }
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    /// Run ffmpeg to completion.
    pub async fn run(&self) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let result = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail_start = stderr
                .char_indices()
                .rev()
                .nth(STDERR_TAIL - 1)
                .map(|(i, _)| i)
                .unwrap_or(0);
            return Err(MediaError::ffmpeg_failed(
                stderr[tail_start..].trim(),
                result.status.code(),
            ));
        }
        Ok(())
    }
}

/// Locate the ffmpeg binary on PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
