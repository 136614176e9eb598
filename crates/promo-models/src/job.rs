//! Job definitions for single-product video generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::backend::BackendKind;
use crate::script::VideoScript;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, pipeline not started yet
    #[default]
    Queued,
    /// Pipeline is running (see `JobStep` for where)
    Processing,
    /// Finished, output video available
    Success,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "success" => Ok(JobStatus::Success),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Pipeline step a processing job is currently in.
///
/// The index is monotonically non-decreasing for the lifetime of a job;
/// post-processing (step 4) only exists when a subtitle or BGM flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    /// Not started yet
    #[default]
    Waiting,
    /// Vision analysis of the uploaded product image
    AnalyzeImage,
    /// Script and render-prompt generation
    WriteScript,
    /// Remote video generation (submit, poll, fetch)
    GenerateVideo,
    /// Subtitle burn-in / BGM mixing
    PostProcess,
}

impl JobStep {
    /// Numeric index shown to clients (0 = waiting, 1..4 = pipeline steps).
    pub fn index(&self) -> u8 {
        match self {
            JobStep::Waiting => 0,
            JobStep::AnalyzeImage => 1,
            JobStep::WriteScript => 2,
            JobStep::GenerateVideo => 3,
            JobStep::PostProcess => 4,
        }
    }

    /// Human-readable label for the status endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            JobStep::Waiting => "Waiting",
            JobStep::AnalyzeImage => "Analyzing product image",
            JobStep::WriteScript => "Writing video script",
            JobStep::GenerateVideo => "Generating video",
            JobStep::PostProcess => "Post-processing",
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(JobStep::Waiting),
            1 => Some(JobStep::AnalyzeImage),
            2 => Some(JobStep::WriteScript),
            3 => Some(JobStep::GenerateVideo),
            4 => Some(JobStep::PostProcess),
            _ => None,
        }
    }
}

/// A single-product video generation job and its tracked state.
///
/// This is the canonical record shape: the same fields are mirrored onto
/// the durable `jobs` table by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Product name as submitted
    pub product_name: String,

    /// Job status
    #[serde(default)]
    pub status: JobStatus,

    /// Current pipeline step
    #[serde(default)]
    pub step: JobStep,

    /// Generation backend for this job
    #[serde(default)]
    pub backend: BackendKind,

    /// Burn subtitles from the script into the output
    #[serde(default)]
    pub add_subtitle: bool,

    /// Mix background music into the output
    #[serde(default)]
    pub add_bgm: bool,

    /// Final output video path (set only on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    /// Generated script (set once step 2 completes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<VideoScript>,

    /// Render prompt sent to the generation backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_prompt: Option<String>,

    /// Error message (set only on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job.
    pub fn new(
        product_name: impl Into<String>,
        backend: BackendKind,
        add_subtitle: bool,
        add_bgm: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            product_name: product_name.into(),
            status: JobStatus::Queued,
            step: JobStep::Waiting,
            backend,
            add_subtitle,
            add_bgm,
            video_path: None,
            script: None,
            video_prompt: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether post-processing (step 4) applies to this job.
    pub fn wants_post_processing(&self) -> bool {
        self.add_subtitle || self.add_bgm
    }

    /// Advance into a pipeline step. Steps never move backwards.
    pub fn enter_step(&mut self, step: JobStep) {
        debug_assert!(step.index() >= self.step.index());
        self.status = JobStatus::Processing;
        self.step = step;
        self.updated_at = Utc::now();
    }

    /// Mark the job as successfully completed.
    pub fn succeed(&mut self, video_path: impl Into<String>) {
        self.status = JobStatus::Success;
        self.video_path = Some(video_path.into());
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed with a human-readable message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = Job::new("Smartwatch V8", BackendKind::Seedance, false, false);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.step, JobStep::Waiting);
        assert!(job.video_path.is_none());
        assert!(job.error.is_none());
        assert!(!job.wants_post_processing());
    }

    #[test]
    fn test_step_indices_are_ordered() {
        let steps = [
            JobStep::Waiting,
            JobStep::AnalyzeImage,
            JobStep::WriteScript,
            JobStep::GenerateVideo,
            JobStep::PostProcess,
        ];
        for pair in steps.windows(2) {
            assert!(pair[0].index() < pair[1].index());
        }
    }

    #[test]
    fn test_success_sets_path_and_clears_error() {
        let mut job = Job::new("Blender", BackendKind::Creatok, true, false);
        job.enter_step(JobStep::AnalyzeImage);
        job.enter_step(JobStep::WriteScript);
        job.succeed("/out/blender.mp4");
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.video_path.as_deref(), Some("/out/blender.mp4"));
        assert!(job.error.is_none());
        assert!(job.is_terminal());
    }

    #[test]
    fn test_failure_sets_error() {
        let mut job = Job::new("Blender", BackendKind::Seedance, false, false);
        job.enter_step(JobStep::AnalyzeImage);
        job.fail("image unclear");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("image unclear"));
        assert!(job.video_path.is_none());
    }
}
