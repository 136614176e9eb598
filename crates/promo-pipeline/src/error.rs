//! Pipeline error types.
//!
//! Display strings double as the user-visible failure messages stored
//! on failed jobs, so they stay short and free of internals.

use thiserror::Error;

use promo_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Step 1 failures collapse to one stable client-facing message;
    /// the underlying cause goes to the log only.
    #[error("Image analysis failed, please check that the image is clear")]
    ImageAnalysis,

    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Generation(String),

    #[error("Video generation timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn script(e: impl std::fmt::Display) -> Self {
        Self::Script(e.to_string())
    }

    pub fn generation(e: impl std::fmt::Display) -> Self {
        Self::Generation(e.to_string())
    }
}
