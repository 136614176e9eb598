//! Subtitle and BGM post-processing.
//!
//! Post-processing is best-effort: a missing FFmpeg, a missing BGM
//! file, or a failed filter run degrades to copying the input video
//! through, and the step is reported as skipped. Only filesystem
//! failures surface as errors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use promo_models::VideoScript;
use serde::Serialize;
use tracing::{info, warn};

use crate::command::{check_ffmpeg, FfmpegCommand};
use crate::error::MediaResult;
use crate::subtitle::{build_subtitle_filters, find_subtitle_font};

/// BGM volume relative to the original audio track.
const BGM_VOLUME: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Skipped,
}

/// Outcome of one post-processing step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StepReport {
    fn applied(step: &'static str) -> Self {
        Self {
            step,
            status: StepStatus::Applied,
            note: None,
        }
    }

    fn skipped(step: &'static str, note: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            note: Some(note.into()),
        }
    }
}

/// What post-processing produced.
#[derive(Debug, Clone)]
pub struct PostProcessOutcome {
    pub output_path: PathBuf,
    pub steps: Vec<StepReport>,
}

/// Seam for the post-processing step.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn process(
        &self,
        video_path: &Path,
        output_path: &Path,
        script: Option<&VideoScript>,
        add_subtitle: bool,
        add_bgm: bool,
    ) -> MediaResult<PostProcessOutcome>;
}

/// FFmpeg-backed post-processor.
pub struct FfmpegPostProcessor {
    bgm_dir: PathBuf,
    font_path: Option<PathBuf>,
}

impl FfmpegPostProcessor {
    pub fn new(bgm_dir: impl Into<PathBuf>) -> Self {
        let bgm_dir = bgm_dir.into();
        if let Err(e) = std::fs::create_dir_all(&bgm_dir) {
            warn!("Cannot create BGM directory {}: {e}", bgm_dir.display());
        }
        Self {
            bgm_dir,
            font_path: find_subtitle_font(),
        }
    }

    /// Burn the script's captions into the video.
    async fn add_subtitles(
        &self,
        video_path: &Path,
        script: &VideoScript,
        output_path: &Path,
    ) -> MediaResult<StepReport> {
        if check_ffmpeg().is_err() {
            tokio::fs::copy(video_path, output_path).await?;
            return Ok(StepReport::skipped("subtitle", "FFmpeg not installed"));
        }

        let filters = build_subtitle_filters(script, self.font_path.as_deref());
        if filters.is_empty() {
            tokio::fs::copy(video_path, output_path).await?;
            return Ok(StepReport {
                step: "subtitle",
                status: StepStatus::Applied,
                note: Some("no caption text".to_string()),
            });
        }

        let cmd = FfmpegCommand::new(video_path, output_path)
            .video_filter(filters.join(","))
            .audio_codec("copy");

        match cmd.run().await {
            Ok(()) => {
                info!("Subtitles burned into {}", output_path.display());
                Ok(StepReport::applied("subtitle"))
            }
            Err(e) => {
                warn!("Subtitle burn-in failed, keeping original video: {e}");
                tokio::fs::copy(video_path, output_path).await?;
                Ok(StepReport::skipped("subtitle", "FFmpeg subtitle pass failed"))
            }
        }
    }

    /// Mix background music under the video's audio track.
    async fn add_bgm(&self, video_path: &Path, output_path: &Path) -> MediaResult<StepReport> {
        if check_ffmpeg().is_err() {
            tokio::fs::copy(video_path, output_path).await?;
            return Ok(StepReport::skipped("bgm", "FFmpeg not installed"));
        }

        let Some(bgm_file) = self.find_bgm() else {
            tokio::fs::copy(video_path, output_path).await?;
            return Ok(StepReport::skipped(
                "bgm",
                format!("no audio file in {}", self.bgm_dir.display()),
            ));
        };
        info!("Mixing BGM: {}", bgm_file.display());

        // First attempt assumes the video has an audio track.
        let mix = FfmpegCommand::new(video_path, output_path)
            .extra_input(&bgm_file)
            .filter_complex(format!(
                "[1:a]volume={BGM_VOLUME},aloop=loop=-1:size=2e+09[bgm];\
                 [0:a][bgm]amix=inputs=2:duration=first:dropout_transition=2[aout]"
            ))
            .map("0:v")
            .map("[aout]")
            .video_codec("copy");

        if mix.run().await.is_ok() {
            return Ok(StepReport::applied("bgm"));
        }

        // Silent video: map the BGM track in directly.
        let overlay = FfmpegCommand::new(video_path, output_path)
            .extra_input(&bgm_file)
            .map("0:v")
            .map("1:a")
            .video_codec("copy")
            .audio_filter(format!("volume={BGM_VOLUME}"))
            .shortest();

        match overlay.run().await {
            Ok(()) => Ok(StepReport::applied("bgm")),
            Err(e) => {
                warn!("BGM mixing failed, keeping original video: {e}");
                tokio::fs::copy(video_path, output_path).await?;
                Ok(StepReport::skipped("bgm", "FFmpeg BGM pass failed"))
            }
        }
    }

    /// First audio file in the BGM directory, by preferred extension.
    fn find_bgm(&self) -> Option<PathBuf> {
        for ext in ["mp3", "wav", "m4a", "aac"] {
            let mut matches: Vec<PathBuf> = std::fs::read_dir(&self.bgm_dir)
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
                .collect();
            matches.sort();
            if let Some(first) = matches.into_iter().next() {
                return Some(first);
            }
        }
        None
    }
}

#[async_trait]
impl PostProcessor for FfmpegPostProcessor {
    async fn process(
        &self,
        video_path: &Path,
        output_path: &Path,
        script: Option<&VideoScript>,
        add_subtitle: bool,
        add_bgm: bool,
    ) -> MediaResult<PostProcessOutcome> {
        if !add_subtitle && !add_bgm {
            tokio::fs::copy(video_path, output_path).await?;
            return Ok(PostProcessOutcome {
                output_path: output_path.to_path_buf(),
                steps: Vec::new(),
            });
        }

        let tmp_dir = output_path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_sub = tmp_dir.join("_tmp_subtitle.mp4");
        let tmp_bgm = tmp_dir.join("_tmp_bgm.mp4");

        let mut steps = Vec::new();
        let mut current = video_path.to_path_buf();

        let result: MediaResult<()> = async {
            if add_subtitle {
                if let Some(script) = script {
                    let report = self.add_subtitles(&current, script, &tmp_sub).await?;
                    if report.status == StepStatus::Applied {
                        current = tmp_sub.clone();
                    }
                    steps.push(report);
                }
            }

            if add_bgm {
                let report = self.add_bgm(&current, &tmp_bgm).await?;
                if report.status == StepStatus::Applied {
                    current = tmp_bgm.clone();
                }
                steps.push(report);
            }

            tokio::fs::copy(&current, output_path).await?;
            Ok(())
        }
        .await;

        for tmp in [&tmp_sub, &tmp_bgm] {
            let _ = tokio::fs::remove_file(tmp).await;
        }
        result?;

        Ok(PostProcessOutcome {
            output_path: output_path.to_path_buf(),
            steps,
        })
    }
}
