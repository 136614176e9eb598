//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

/// Settings for the HTTP server and its local resources.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` means any.
    pub cors_origins: Vec<String>,
    /// Upload size cap in bytes (product photos).
    pub max_body_size: usize,
    pub database_path: PathBuf,
    /// Directory scanned for background-music tracks.
    pub bgm_dir: PathBuf,
    pub environment: String,
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origins: vec!["*".into()],
            max_body_size: 10 * 1024 * 1024,
            database_path: "data/jobs.db".into(),
            bgm_dir: "static/bgm".into(),
            environment: "development".into(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: env_or("API_HOST", d.host),
            port: env_or("API_PORT", d.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| raw.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or(d.cors_origins),
            max_body_size: env_or("MAX_BODY_SIZE", d.max_body_size),
            database_path: env_or("DATABASE_PATH", d.database_path),
            bgm_dir: env_or("BGM_DIR", d.bgm_dir),
            environment: env_or("ENVIRONMENT", d.environment),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
