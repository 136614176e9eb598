//! Pipeline configuration.

use std::path::PathBuf;

use promo_videogen::WaitConfig;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-job output directories live under here
    pub output_dir: PathBuf,
    /// Staged uploads and batch zip archives live under here
    pub temp_dir: PathBuf,
    /// Completion waiter parameters
    pub wait: WaitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            temp_dir: PathBuf::from("temp"),
            wait: WaitConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            wait: WaitConfig::from_env(),
        }
    }

    /// Directory staged uploads are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.join("uploads")
    }

    /// Directory batch zip archives are written to.
    pub fn zip_dir(&self) -> PathBuf {
        self.temp_dir.join("batch_zips")
    }
}
