//! FFmpeg-based video post-processing.
//!
//! Burns script captions into the generated video and mixes in
//! background music. Every step degrades gracefully: when FFmpeg or a
//! BGM file is unavailable the input video is passed through unchanged.

pub mod command;
pub mod error;
pub mod postprocess;
pub mod subtitle;

pub use command::{check_ffmpeg, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use postprocess::{
    FfmpegPostProcessor, PostProcessOutcome, PostProcessor, StepReport, StepStatus,
};
pub use subtitle::{build_subtitle_filters, escape_drawtext, find_subtitle_font};
