//! Creatok adapter: general-purpose text-to-video service.

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

/// Creatok adapter configuration.
#[derive(Debug, Clone)]
pub struct CreatokConfig {
    /// API base URL
    pub api_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Task creation timeout
    pub submit_timeout: Duration,
    /// Status poll timeout
    pub poll_timeout: Duration,
}

impl Default for CreatokConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.creatok.ai/v1".to_string(),
            api_key: String::new(),
            model: "creatok-v1".to_string(),
            submit_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
        }
    }
}

impl CreatokConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("CREATOK_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("CREATOK_API_KEY").unwrap_or_default(),
            ..defaults
        }
    }
}

/// Client for the Creatok generation API.
pub struct CreatokBackend {
    http: Client,
    config: CreatokConfig,
}

#[derive(Serialize)]
struct GenerateRequestBody {
    prompt: String,
    duration: u32,
    aspect_ratio: String,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image: Option<String>,
}

#[derive(Deserialize)]
struct VideoStatusResponse {
    status: Option<String>,
    video_url: Option<String>,
    url: Option<String>,
    error: Option<String>,
    #[serde(default)]
    progress: u8,
}

impl CreatokBackend {
    pub fn new(config: CreatokConfig) -> VideogenResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| VideogenError::request(BackendKind::Creatok, e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl VideoBackend for CreatokBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Creatok
    }

    async fn submit(&self, request: &GenerationRequest) -> VideogenResult<TaskHandle> {
        info!(
            "Submitting Creatok task: duration={}s ratio={}",
            request.duration_secs, request.aspect_ratio
        );

        let reference_image = request.reference_data_url().await?;
        if reference_image.is_some() {
            debug!("Attaching reference image to Creatok task");
        }

        let body = GenerateRequestBody {
            prompt: request.prompt.clone(),
            duration: request.duration_secs,
            aspect_ratio: request.aspect_ratio.clone(),
            model: self.config.model.clone(),
            reference_image,
        };

        let url = format!("{}/videos/generate", self.config.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.submit_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| VideogenError::request(BackendKind::Creatok, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VideogenError::request(
                BackendKind::Creatok,
                format!("status {status}: {body}"),
            ));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| VideogenError::invalid_response(BackendKind::Creatok, e.to_string()))?;

        let task_id = value
            .get("task_id")
            .or_else(|| value.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VideogenError::invalid_response(BackendKind::Creatok, "missing task id")
            })?;

        info!("Creatok task created: {}", task_id);
        Ok(TaskHandle {
            task_id: task_id.to_string(),
            backend: BackendKind::Creatok,
        })
    }

    async fn poll(&self, handle: &TaskHandle) -> VideogenResult<PollStatus> {
        let url = format!("{}/videos/{}", self.config.api_url, handle.task_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.poll_timeout)
            .send()
            .await
            .map_err(|e| VideogenError::request(BackendKind::Creatok, e.to_string()))?;

        if !response.status().is_success() {
            return Err(VideogenError::request(
                BackendKind::Creatok,
                format!("status poll returned {}", response.status()),
            ));
        }

        let status: VideoStatusResponse = response
            .json()
            .await
            .map_err(|e| VideogenError::invalid_response(BackendKind::Creatok, e.to_string()))?;

        match status.status.as_deref() {
            Some("completed") => {
                let video_url = status.video_url.or(status.url).ok_or_else(|| {
                    VideogenError::invalid_response(
                        BackendKind::Creatok,
                        "task completed but no video url",
                    )
                })?;
                Ok(PollStatus::Completed { video_url })
            }
            Some("failed") => Ok(PollStatus::Failed {
                reason: status.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            _ => {
                debug!("Creatok task {} at {}%", handle.task_id, status.progress);
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_backend(server: &MockServer) -> CreatokBackend {
        CreatokBackend::new(CreatokConfig {
            api_url: server.uri(),
            api_key: "ck-key".to_string(),
            ..CreatokConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "ct-7"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos/ct-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed", "url": "https://cdn.example/done.mp4"
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server);
        let handle = backend
            .submit(&GenerationRequest::new("demo", 15))
            .await
            .unwrap();
        assert_eq!(handle.task_id, "ct-7");

        // `url` is accepted when `video_url` is absent
        assert_eq!(
            backend.poll(&handle).await.unwrap(),
            PollStatus::Completed {
                video_url: "https://cdn.example/done.mp4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_pending_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/ct-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "queued"
            })))
            .mount(&server)
            .await;

        let backend = test_backend(&server);
        let handle = TaskHandle {
            task_id: "ct-9".to_string(),
            backend: BackendKind::Creatok,
        };
        assert_eq!(
            backend.poll(&handle).await.unwrap(),
            PollStatus::Pending { progress: 0 }
        );
    }
}
