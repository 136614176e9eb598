//! Single-job pipeline orchestration.
//!
//! One spawned task per job drives the four steps: image analysis,
//! script generation, video generation, optional post-processing. The
//! job record is written through to the store at every transition, and
//! the staged upload is removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use promo_ai::{ProductVision, ScriptWriter};
use promo_media::PostProcessor;
use promo_models::{sanitize_product_name, BackendKind, Job, JobStep};
use promo_store::{BatchRegistry, JobStore};
use promo_videogen::{
    wait_for_completion, GenerationRequest, VideoBackend, VideogenResult, WaitOutcome,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Constructs a backend adapter per job, so each job picks up current
/// environment configuration and tests can inject fakes.
pub type BackendFactory =
    Arc<dyn Fn(BackendKind) -> VideogenResult<Box<dyn VideoBackend>> + Send + Sync>;

pub struct Orchestrator {
    pub(crate) store: Arc<JobStore>,
    pub(crate) batches: Arc<BatchRegistry>,
    pub(crate) vision: Arc<dyn ProductVision>,
    pub(crate) scripts: Arc<dyn ScriptWriter>,
    pub(crate) post: Arc<dyn PostProcessor>,
    pub(crate) backends: BackendFactory,
    pub(crate) config: PipelineConfig,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<JobStore>,
        batches: Arc<BatchRegistry>,
        vision: Arc<dyn ProductVision>,
        scripts: Arc<dyn ScriptWriter>,
        post: Arc<dyn PostProcessor>,
        backends: BackendFactory,
        config: PipelineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            batches,
            vision,
            scripts,
            post,
            backends,
            config,
        })
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn batches(&self) -> &Arc<BatchRegistry> {
        &self.batches
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a job's pipeline in a background task.
    ///
    /// The job must already be saved in the store; `image_path` is the
    /// staged upload, which is deleted when the task finishes.
    pub fn spawn_job(
        self: &Arc<Self>,
        job: Job,
        image_path: PathBuf,
        selling_points: Vec<String>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_job(job, image_path, selling_points).await;
        })
    }

    async fn run_job(&self, mut job: Job, image_path: PathBuf, selling_points: Vec<String>) {
        let output_dir = self.config.output_dir.join(job.id.as_str());
        info!(job_id = %job.id, product = %job.product_name, "Pipeline started");

        match self
            .execute_job(&mut job, &output_dir, &image_path, &selling_points)
            .await
        {
            Ok(video_path) => {
                info!(job_id = %job.id, "Pipeline finished: {}", video_path.display());
                job.succeed(video_path.to_string_lossy());
            }
            Err(e) => {
                warn!(job_id = %job.id, step = job.step.index(), "Pipeline failed: {e}");
                job.fail(e.to_string());
            }
        }

        if let Err(e) = self.store.save(&job).await {
            error!(job_id = %job.id, "Cannot persist terminal job state: {e}");
        }

        if let Err(e) = tokio::fs::remove_file(&image_path).await {
            if image_path.exists() {
                warn!("Cannot remove staged upload {}: {e}", image_path.display());
            }
        }
    }

    async fn execute_job(
        &self,
        job: &mut Job,
        output_dir: &Path,
        image_path: &Path,
        selling_points: &[String],
    ) -> PipelineResult<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;

        // Step 1: analyze the product image.
        job.enter_step(JobStep::AnalyzeImage);
        self.store.save(job).await?;
        let vision = self
            .vision
            .process(image_path, &output_dir.join("processed"))
            .await
            .map_err(|e| {
                warn!(job_id = %job.id, "Image analysis failed: {e}");
                PipelineError::ImageAnalysis
            })?;

        // Step 2: write the script and render prompt.
        job.enter_step(JobStep::WriteScript);
        self.store.save(job).await?;
        let duration = job.backend.default_duration_secs();
        let script = self
            .scripts
            .generate_script(&job.product_name, &vision.description, selling_points, duration)
            .await
            .map_err(PipelineError::script)?;
        let prompt = self
            .scripts
            .generate_prompt(&vision.description, &script)
            .await
            .map_err(PipelineError::script)?;

        tokio::fs::write(
            output_dir.join("script.json"),
            serde_json::to_vec_pretty(&script).map_err(PipelineError::script)?,
        )
        .await?;
        tokio::fs::write(output_dir.join("video_prompt.txt"), &prompt).await?;

        job.script = Some(script);
        job.video_prompt = Some(prompt.clone());

        // Step 3: generate the video.
        job.enter_step(JobStep::GenerateVideo);
        self.store.save(job).await?;
        let safe_name = sanitize_product_name(&job.product_name);
        let final_path = output_dir.join(format!("{safe_name}.mp4"));
        let raw_path = if job.wants_post_processing() {
            output_dir.join(format!("{safe_name}_raw.mp4"))
        } else {
            final_path.clone()
        };
        self.generate_video(
            job.backend,
            &prompt,
            Some(&vision.reference_image),
            duration,
            &raw_path,
        )
        .await?;

        if !job.wants_post_processing() {
            return Ok(final_path);
        }

        // Step 4: subtitle burn-in / BGM. Best-effort: a failure here
        // delivers the raw video instead of failing the job.
        job.enter_step(JobStep::PostProcess);
        self.store.save(job).await?;
        let script_ref = if job.add_subtitle {
            job.script.as_ref()
        } else {
            None
        };
        match self
            .post
            .process(&raw_path, &final_path, script_ref, job.add_subtitle, job.add_bgm)
            .await
        {
            Ok(outcome) => {
                for step in &outcome.steps {
                    info!(job_id = %job.id, step = step.step, status = ?step.status, "Post-processing step");
                }
                let _ = tokio::fs::remove_file(&raw_path).await;
                Ok(final_path)
            }
            Err(e) => {
                warn!(job_id = %job.id, "Post-processing failed, delivering raw video: {e}");
                if tokio::fs::rename(&raw_path, &final_path).await.is_ok() {
                    Ok(final_path)
                } else {
                    Ok(raw_path)
                }
            }
        }
    }

    /// Submit, wait, fetch. Shared by single jobs and batch items.
    pub(crate) async fn generate_video(
        &self,
        kind: BackendKind,
        prompt: &str,
        reference_image: Option<&Path>,
        duration: u32,
        output_path: &Path,
    ) -> PipelineResult<()> {
        let backend = (self.backends)(kind).map_err(PipelineError::generation)?;

        let mut request = GenerationRequest::new(prompt, duration);
        if let Some(reference) = reference_image {
            request = request.with_reference_image(reference);
        }

        let handle = backend
            .submit(&request)
            .await
            .map_err(PipelineError::generation)?;

        match wait_for_completion(backend.as_ref(), &handle, &self.config.wait)
            .await
            .map_err(PipelineError::generation)?
        {
            WaitOutcome::Completed { video_url } => {
                backend
                    .fetch(&video_url, output_path)
                    .await
                    .map_err(PipelineError::generation)?;
                Ok(())
            }
            WaitOutcome::Failed { reason } => Err(PipelineError::Generation(reason)),
            WaitOutcome::TimedOut { waited } => Err(PipelineError::Timeout(waited.as_secs())),
        }
    }
}
