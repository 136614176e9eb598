//! Shared application state.

use std::sync::Arc;

use anyhow::Result;

use promo_ai::{OpenAiClient, OpenAiScriptWriter, OpenAiVision};
use promo_media::FfmpegPostProcessor;
use promo_pipeline::{BackendFactory, Orchestrator, PipelineConfig};
use promo_store::{BatchRegistry, Database, JobStore};
use promo_videogen::backend_from_env;

use crate::config::ApiConfig;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wire up the store, AI collaborators and pipeline from config.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        let store = Arc::new(JobStore::new(db));
        let batches = Arc::new(BatchRegistry::new());

        let ai = OpenAiClient::from_env()?;
        let vision = Arc::new(OpenAiVision::new(ai));
        let scripts = Arc::new(OpenAiScriptWriter::new(OpenAiClient::from_env()?));
        let post = Arc::new(FfmpegPostProcessor::new(&config.bgm_dir));
        let backends: BackendFactory = Arc::new(backend_from_env);

        let orchestrator = Orchestrator::new(
            store,
            batches,
            vision,
            scripts,
            post,
            backends,
            PipelineConfig::from_env(),
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// Build state around an existing orchestrator (used by tests).
    pub fn with_orchestrator(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        self.orchestrator.store()
    }

    pub fn batches(&self) -> &Arc<BatchRegistry> {
        self.orchestrator.batches()
    }
}
