//! Seedance adapter: direct-connect image-to-video service.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use promo_models::BackendKind;

use crate::backend::{GenerationRequest, PollStatus, TaskHandle, VideoBackend};
use crate::download::download_artifact;
use crate::error::{VideogenError, VideogenResult};

/// Seedance adapter configuration.
#[derive(Debug, Clone)]
pub struct SeedanceConfig {
    /// API base URL
    pub api_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier sent with every task
    pub model_id: String,
    /// Output resolution appended to the prompt
    pub resolution: String,
    /// Task creation timeout
    pub submit_timeout: Duration,
    /// Status poll timeout
    pub poll_timeout: Duration,
}

impl Default for SeedanceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            api_key: String::new(),
            model_id: "doubao-seedance-1-0-lite-i2v-250428".to_string(),
            resolution: "720p".to_string(),
            submit_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(15),
        }
    }
}

impl SeedanceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("SEEDANCE_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("ARK_API_KEY").unwrap_or_default(),
            model_id: std::env::var("SEEDANCE_MODEL_ID").unwrap_or(defaults.model_id),
            resolution: std::env::var("SEEDANCE_RESOLUTION").unwrap_or(defaults.resolution),
            ..defaults
        }
    }
}

/// Client for the Seedance generation API.
pub struct SeedanceBackend {
    http: Client,
    config: SeedanceConfig,
}

#[derive(Serialize)]
struct CreateTaskRequest {
    model: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct TaskStatusResponse {
    status: Option<String>,
    video_url: Option<String>,
    error: Option<String>,
    #[serde(default)]
    progress: u8,
}

impl SeedanceBackend {
    pub fn new(config: SeedanceConfig) -> VideogenResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| VideogenError::request(BackendKind::Seedance, e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Prompt text with control parameters appended, the way the service
    /// expects them.
    fn prompt_with_params(&self, request: &GenerationRequest) -> String {
        format!(
            "{} --resolution {} --duration {} --ratio {}",
            request.prompt, self.config.resolution, request.duration_secs, request.aspect_ratio
        )
    }
}

#[async_trait]
impl VideoBackend for SeedanceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Seedance
    }

    async fn submit(&self, request: &GenerationRequest) -> VideogenResult<TaskHandle> {
        info!(
            "Submitting Seedance task: model={} duration={}s ratio={}",
            self.config.model_id, request.duration_secs, request.aspect_ratio
        );

        let mut content = vec![ContentPart::Text {
            text: self.prompt_with_params(request),
        }];
        if let Some(data_url) = request.reference_data_url().await? {
            debug!("Attaching reference image to Seedance task");
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            });
        }

        let body = CreateTaskRequest {
            model: self.config.model_id.clone(),
            content,
        };

        let url = format!("{}/contents/generations/tasks", self.config.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.submit_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| VideogenError::request(BackendKind::Seedance, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VideogenError::request(
                BackendKind::Seedance,
                format!("status {status}: {body}"),
            ));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| VideogenError::invalid_response(BackendKind::Seedance, e.to_string()))?;

        let task_id = value
            .get("task_id")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VideogenError::invalid_response(BackendKind::Seedance, "missing task id")
            })?;

        info!("Seedance task created: {}", task_id);
        Ok(TaskHandle {
            task_id: task_id.to_string(),
            backend: BackendKind::Seedance,
        })
    }

    async fn poll(&self, handle: &TaskHandle) -> VideogenResult<PollStatus> {
        let url = format!(
            "{}/contents/generations/tasks/{}",
            self.config.api_url, handle.task_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.poll_timeout)
            .send()
            .await
            .map_err(|e| VideogenError::request(BackendKind::Seedance, e.to_string()))?;

        if !response.status().is_success() {
            return Err(VideogenError::request(
                BackendKind::Seedance,
                format!("status poll returned {}", response.status()),
            ));
        }

        let status: TaskStatusResponse = response
            .json()
            .await
            .map_err(|e| VideogenError::invalid_response(BackendKind::Seedance, e.to_string()))?;

        match status.status.as_deref() {
            Some("done") => {
                let video_url = status.video_url.ok_or_else(|| {
                    VideogenError::invalid_response(
                        BackendKind::Seedance,
                        "task done but no video_url",
                    )
                })?;
                Ok(PollStatus::Completed { video_url })
            }
            Some("failed") => Ok(PollStatus::Failed {
                reason: status.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            _ => {
                debug!("Seedance task {} at {}%", handle.task_id, status.progress);
                Ok(PollStatus::Pending {
                    progress: status.progress,
                })
            }
        }
    }

    async fn fetch(&self, video_url: &str, output_path: &Path) -> VideogenResult<u64> {
        download_artifact(&self.http, video_url, output_path).await
    }
}
