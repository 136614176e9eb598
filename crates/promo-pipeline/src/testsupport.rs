//! Fake collaborators for pipeline tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use promo_ai::{AiError, AiResult, ProductVision, ScriptWriter, VisionOutcome};
use promo_media::{
    MediaError, MediaResult, PostProcessOutcome, PostProcessor, StepReport, StepStatus,
};
use promo_models::{BackendKind, ScriptScene, VideoScript};
use promo_store::{BatchRegistry, Database, JobStore};
use promo_videogen::{
    GenerationRequest, PollStatus, TaskHandle, VideoBackend, VideogenResult, WaitConfig,
};

use crate::config::PipelineConfig;
use crate::orchestrator::{BackendFactory, Orchestrator};

/// Knobs controlling where the fake pipeline fails.
#[derive(Debug, Clone, Default)]
pub struct FakeBehavior {
    pub vision_fails: bool,
    /// Script generation fails for this exact product name.
    pub script_fails_for: Option<String>,
    /// Generation tasks end in a backend failure with this reason.
    pub generation_fails_with: Option<String>,
    pub post_fails: bool,
}

struct FakeVision {
    fails: bool,
}

#[async_trait]
impl ProductVision for FakeVision {
    async fn process(&self, _image_path: &Path, output_dir: &Path) -> AiResult<VisionOutcome> {
        if self.fails {
            return Err(AiError::request("camera broke"));
        }
        tokio::fs::create_dir_all(output_dir).await?;
        let reference_image = output_dir.join("white_bg.png");
        tokio::fs::write(&reference_image, b"png").await?;
        Ok(VisionOutcome {
            description: "A test product.".to_string(),
            reference_image,
        })
    }
}

struct FakeScripts {
    fails_for: Option<String>,
}

#[async_trait]
impl ScriptWriter for FakeScripts {
    async fn generate_script(
        &self,
        product_name: &str,
        _description: &str,
        _selling_points: &[String],
        duration_secs: u32,
    ) -> AiResult<VideoScript> {
        if self.fails_for.as_deref() == Some(product_name) {
            return Err(AiError::request("model offline"));
        }
        Ok(VideoScript {
            hook: "Check this out".to_string(),
            scenes: vec![ScriptScene {
                duration: duration_secs as f64,
                description: "product close-up".to_string(),
                text: "So good".to_string(),
            }],
            cta: "Buy now".to_string(),
        })
    }

    async fn generate_prompt(&self, description: &str, _script: &VideoScript) -> AiResult<String> {
        Ok(format!("cinematic shot of {description}"))
    }
}

struct FakeBackend {
    kind: BackendKind,
    fails_with: Option<String>,
}

#[async_trait]
impl VideoBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn submit(&self, _request: &GenerationRequest) -> VideogenResult<TaskHandle> {
        Ok(TaskHandle {
            task_id: "task-1".to_string(),
            backend: self.kind,
        })
    }

    async fn poll(&self, _handle: &TaskHandle) -> VideogenResult<PollStatus> {
        match &self.fails_with {
            Some(reason) => Ok(PollStatus::Failed {
                reason: reason.clone(),
            }),
            None => Ok(PollStatus::Completed {
                video_url: "https://cdn.example/v.mp4".to_string(),
            }),
        }
    }

    async fn fetch(&self, _video_url: &str, output_path: &Path) -> VideogenResult<u64> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, b"fakevideo").await?;
        Ok(9)
    }
}

struct FakePost {
    fails: bool,
}

#[async_trait]
impl PostProcessor for FakePost {
    async fn process(
        &self,
        video_path: &Path,
        output_path: &Path,
        _script: Option<&VideoScript>,
        add_subtitle: bool,
        add_bgm: bool,
    ) -> MediaResult<PostProcessOutcome> {
        if self.fails {
            return Err(MediaError::Io(std::io::Error::other("disk full")));
        }
        tokio::fs::copy(video_path, output_path).await?;
        let mut steps = Vec::new();
        if add_subtitle {
            steps.push(StepReport {
                step: "subtitle",
                status: StepStatus::Applied,
                note: None,
            });
        }
        if add_bgm {
            steps.push(StepReport {
                step: "bgm",
                status: StepStatus::Applied,
                note: None,
            });
        }
        Ok(PostProcessOutcome {
            output_path: output_path.to_path_buf(),
            steps,
        })
    }
}

/// Build an orchestrator wired to fakes, plus a staged upload file.
pub async fn harness(root: &Path, behavior: FakeBehavior) -> (Arc<Orchestrator>, PathBuf) {
    let store = Arc::new(JobStore::new(Database::open_in_memory().unwrap()));
    let batches = Arc::new(BatchRegistry::new());

    let config = PipelineConfig {
        output_dir: root.join("output"),
        temp_dir: root.join("temp"),
        wait: WaitConfig {
            max_wait: Duration::from_millis(500),
            interval: Duration::from_millis(5),
        },
    };

    let generation_fails_with = behavior.generation_fails_with.clone();
    let backends: BackendFactory = Arc::new(move |kind| {
        Ok(Box::new(FakeBackend {
            kind,
            fails_with: generation_fails_with.clone(),
        }) as Box<dyn VideoBackend>)
    });

    let orchestrator = Orchestrator::new(
        store,
        batches,
        Arc::new(FakeVision {
            fails: behavior.vision_fails,
        }),
        Arc::new(FakeScripts {
            fails_for: behavior.script_fails_for.clone(),
        }),
        Arc::new(FakePost {
            fails: behavior.post_fails,
        }),
        backends,
        config,
    );

    let image_path = root.join("upload.jpg");
    tokio::fs::write(&image_path, b"jpeg").await.unwrap();

    (orchestrator, image_path)
}
