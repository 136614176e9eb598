//! Media processing error types.

use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg is not installed or not on PATH")]
    FfmpegNotFound,

    #[error("ffmpeg exited with {code:?}: {stderr}")]
    FfmpegFailed { stderr: String, code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn ffmpeg_failed(stderr: impl Into<String>, code: Option<i32>) -> Self {
        Self::FfmpegFailed {
            stderr: stderr.into(),
            code,
        }
    }
}
