//! Batch orchestration: several products rendered sequentially under
//! one configuration.
//!
//! Items are isolated: one failure is recorded on that item and the
//! batch moves on. Batch mode skips image analysis; the selling points
//! double as the product description. Terminal items are mirrored into
//! the job store so they show up in history.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use promo_models::{
    sanitize_product_name, Batch, BatchId, BatchItem, BatchItemStatus, BatchStatus, Job, JobId,
    VideoScript,
};

use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::Orchestrator;

/// What one successfully processed batch item produced.
struct ItemOutput {
    video_path: String,
    script: VideoScript,
    video_prompt: String,
}

impl Orchestrator {
    /// Run a batch in a background task. The batch must already be in
    /// the registry.
    pub fn spawn_batch(self: &Arc<Self>, batch_id: BatchId) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_batch(batch_id).await;
        })
    }

    async fn run_batch(&self, batch_id: BatchId) {
        let Some(batch) = self
            .batches
            .update(&batch_id, |b| b.status = BatchStatus::Processing)
            .await
        else {
            error!(batch_id = %batch_id, "Batch not found in registry");
            return;
        };
        info!(batch_id = %batch_id, items = batch.items.len(), "Batch started");
        let duration = batch.backend.default_duration_secs();

        for (index, item) in batch.items.iter().enumerate() {
            if item.status != BatchItemStatus::Pending {
                continue;
            }
            self.batches
                .update(&batch_id, |b| {
                    b.items[index].status = BatchItemStatus::Processing
                })
                .await;

            match self.process_batch_item(&batch, item, duration).await {
                Ok(output) => {
                    self.mirror_item(&batch, item, Ok(&output)).await;
                    self.batches
                        .update(&batch_id, |b| {
                            b.items[index].status = BatchItemStatus::Success;
                            b.items[index].video_path = output.video_path.clone();
                            b.completed += 1;
                        })
                        .await;
                }
                Err(e) => {
                    warn!(batch_id = %batch_id, product = %item.product_name, "Batch item failed: {e}");
                    let message = e.to_string();
                    self.mirror_item(&batch, item, Err(&message)).await;
                    self.batches
                        .update(&batch_id, |b| {
                            b.items[index].status = BatchItemStatus::Failed;
                            b.items[index].error = message.clone();
                            b.failed += 1;
                        })
                        .await;
                }
            }
        }

        if let Some(done) = self
            .batches
            .update(&batch_id, |b| b.status = BatchStatus::Done)
            .await
        {
            info!(
                batch_id = %batch_id,
                "Batch finished: {} succeeded, {} failed",
                done.completed,
                done.failed
            );
        }
    }

    async fn process_batch_item(
        &self,
        batch: &Batch,
        item: &BatchItem,
        duration: u32,
    ) -> PipelineResult<ItemOutput> {
        let output_dir = self
            .config
            .output_dir
            .join("batch")
            .join(batch.batch_id.as_str())
            .join(&item.item_id);
        tokio::fs::create_dir_all(&output_dir).await?;

        // No vision pass in batch mode; the selling points stand in for
        // the product description.
        let description = if item.selling_points.is_empty() {
            item.product_name.clone()
        } else {
            item.selling_points.join(", ")
        };

        let script = self
            .scripts
            .generate_script(&item.product_name, &description, &item.selling_points, duration)
            .await
            .map_err(PipelineError::script)?;
        let prompt = self
            .scripts
            .generate_prompt(&description, &script)
            .await
            .map_err(PipelineError::script)?;
        tokio::fs::write(
            output_dir.join("script.json"),
            serde_json::to_vec_pretty(&script).map_err(PipelineError::script)?,
        )
        .await?;

        let safe_name = sanitize_product_name(&item.product_name);
        let raw_path = output_dir.join(format!("{safe_name}_raw.mp4"));
        let final_path = output_dir.join(format!("{safe_name}.mp4"));

        let reference_image = if batch.reference_image_path.is_empty() {
            None
        } else {
            Some(Path::new(&batch.reference_image_path))
        };
        self.generate_video(batch.backend, &prompt, reference_image, duration, &raw_path)
            .await?;

        if batch.add_subtitle || batch.add_bgm {
            let script_ref = batch.add_subtitle.then_some(&script);
            if let Err(e) = self
                .post
                .process(
                    &raw_path,
                    &final_path,
                    script_ref,
                    batch.add_subtitle,
                    batch.add_bgm,
                )
                .await
            {
                warn!(product = %item.product_name, "Post-processing failed, delivering raw video: {e}");
                tokio::fs::copy(&raw_path, &final_path).await?;
            }
        } else {
            tokio::fs::copy(&raw_path, &final_path).await?;
        }
        let _ = tokio::fs::remove_file(&raw_path).await;

        Ok(ItemOutput {
            video_path: final_path.to_string_lossy().to_string(),
            script,
            video_prompt: prompt,
        })
    }

    /// Mirror a terminal batch item into the job store as a history row.
    async fn mirror_item(&self, batch: &Batch, item: &BatchItem, outcome: Result<&ItemOutput, &str>) {
        let mut job = Job::new(
            &item.product_name,
            batch.backend,
            batch.add_subtitle,
            batch.add_bgm,
        );
        job.id = JobId::from_string(&item.item_id);
        match outcome {
            Ok(output) => {
                job.script = Some(output.script.clone());
                job.video_prompt = Some(output.video_prompt.clone());
                job.succeed(&output.video_path);
            }
            Err(message) => job.fail(message),
        }
        if let Err(e) = self.store.save(&job).await {
            error!(item_id = %item.item_id, "Cannot mirror batch item to history: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{harness, FakeBehavior};
    use promo_models::{BackendKind, JobStatus};

    fn batch_of(names: &[&str], backend: BackendKind) -> Batch {
        let items = names
            .iter()
            .map(|n| BatchItem::new(*n, vec!["great value".to_string()]))
            .collect();
        Batch::new(items, backend, false, false, "")
    }

    #[tokio::test]
    async fn test_batch_processes_all_items() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _image) = harness(dir.path(), FakeBehavior::default()).await;

        let batch = batch_of(&["Mug", "Kettle"], BackendKind::Seedance);
        let id = batch.batch_id.clone();
        orchestrator.batches().insert(batch).await;
        orchestrator.spawn_batch(id.clone()).await.unwrap();

        let done = orchestrator.batches().get(&id).await.unwrap();
        assert_eq!(done.status, BatchStatus::Done);
        assert_eq!(done.completed, 2);
        assert_eq!(done.failed, 0);
        assert!(done.counters_consistent());
        for item in &done.items {
            assert_eq!(item.status, BatchItemStatus::Success);
            assert!(Path::new(&item.video_path).exists());
        }
    }

    #[tokio::test]
    async fn test_failing_item_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let behavior = FakeBehavior {
            script_fails_for: Some("Kettle".to_string()),
            ..FakeBehavior::default()
        };
        let (orchestrator, _image) = harness(dir.path(), behavior).await;

        let batch = batch_of(&["Mug", "Kettle", "Lamp"], BackendKind::Creatok);
        let id = batch.batch_id.clone();
        orchestrator.batches().insert(batch).await;
        orchestrator.spawn_batch(id.clone()).await.unwrap();

        let done = orchestrator.batches().get(&id).await.unwrap();
        assert_eq!(done.status, BatchStatus::Done);
        assert_eq!(done.completed, 2);
        assert_eq!(done.failed, 1);
        assert!(done.counters_consistent());
        assert_eq!(done.items[1].status, BatchItemStatus::Failed);
        assert_eq!(done.items[1].error, "AI request failed: model offline");
        assert_eq!(done.items[2].status, BatchItemStatus::Success);
    }

    #[tokio::test]
    async fn test_terminal_items_are_mirrored_to_history() {
        let dir = tempfile::tempdir().unwrap();
        let behavior = FakeBehavior {
            script_fails_for: Some("Kettle".to_string()),
            ..FakeBehavior::default()
        };
        let (orchestrator, _image) = harness(dir.path(), behavior).await;

        let batch = batch_of(&["Mug", "Kettle"], BackendKind::Seedance);
        let id = batch.batch_id.clone();
        let item_ids: Vec<String> = batch.items.iter().map(|i| i.item_id.clone()).collect();
        orchestrator.batches().insert(batch).await;
        orchestrator.spawn_batch(id).await.unwrap();

        let mirrored_ok = orchestrator
            .store()
            .get(&JobId::from_string(&item_ids[0]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored_ok.status, JobStatus::Success);
        assert!(mirrored_ok.video_path.is_some());
        assert!(mirrored_ok.script.is_some());

        let mirrored_failed = orchestrator
            .store()
            .get(&JobId::from_string(&item_ids[1]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored_failed.status, JobStatus::Failed);
        assert!(mirrored_failed.error.is_some());
    }

    #[tokio::test]
    async fn test_batch_skips_image_analysis() {
        let dir = tempfile::tempdir().unwrap();
        // A failing vision fake would sink any pipeline that calls it.
        let behavior = FakeBehavior {
            vision_fails: true,
            ..FakeBehavior::default()
        };
        let (orchestrator, _image) = harness(dir.path(), behavior).await;

        let batch = batch_of(&["Mug"], BackendKind::Seedance);
        let id = batch.batch_id.clone();
        orchestrator.batches().insert(batch).await;
        orchestrator.spawn_batch(id.clone()).await.unwrap();

        let done = orchestrator.batches().get(&id).await.unwrap();
        assert_eq!(done.completed, 1);
    }

    #[tokio::test]
    async fn test_non_pending_items_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _image) = harness(dir.path(), FakeBehavior::default()).await;

        let mut batch = batch_of(&["Mug", "Kettle"], BackendKind::Seedance);
        batch.items[0].status = BatchItemStatus::Failed;
        batch.failed = 1;
        let id = batch.batch_id.clone();
        orchestrator.batches().insert(batch).await;
        orchestrator.spawn_batch(id.clone()).await.unwrap();

        let done = orchestrator.batches().get(&id).await.unwrap();
        assert_eq!(done.completed, 1);
        assert_eq!(done.failed, 1);
        assert_eq!(done.items[0].status, BatchItemStatus::Failed);
    }
}
