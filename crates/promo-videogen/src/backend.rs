//! The uniform backend capability: submit, poll, fetch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;

use promo_models::BackendKind;

use crate::error::VideogenResult;

/// Opaque backend-assigned task identifier plus the backend it belongs to.
/// Scoped to one generation call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: String,
    pub backend: BackendKind,
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Still generating. Never an error.
    Pending { progress: u8 },
    /// Finished; artifact retrievable at the given URL.
    Completed { video_url: String },
    /// The backend gave up on the task.
    Failed { reason: String },
}

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Render prompt text
    pub prompt: String,
    /// Optional local reference image (white-background product shot)
    pub reference_image: Option<PathBuf>,
    /// Clip duration in seconds
    pub duration_secs: u32,
    /// Aspect ratio, e.g. "9:16"
    pub aspect_ratio: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image: None,
            duration_secs,
            aspect_ratio: "9:16".to_string(),
        }
    }

    pub fn with_reference_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_image = Some(path.into());
        self
    }

    /// Encode the reference image as a base64 data URL, if one is set and
    /// exists on disk.
    pub async fn reference_data_url(&self) -> VideogenResult<Option<String>> {
        let Some(path) = self.reference_image.as_deref() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(encode_image_data_url(path).await?))
    }
}

/// Read a local image and encode it as a `data:` URL.
pub async fn encode_image_data_url(path: &Path) -> VideogenResult<String> {
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    };
    let bytes = tokio::fs::read(path).await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Uniform capability over the generation services.
///
/// Adapters hold no mutable job state; their only side effects are
/// outbound network calls.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Which service this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Create a remote generation task.
    async fn submit(&self, request: &GenerationRequest) -> VideogenResult<TaskHandle>;

    /// Check the status of a previously submitted task.
    async fn poll(&self, handle: &TaskHandle) -> VideogenResult<PollStatus>;

    /// Download the finished artifact to a local path. Returns the number
    /// of bytes written.
    async fn fetch(&self, video_url: &str, output_path: &Path) -> VideogenResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_data_url_missing_file_is_none() {
        let request = GenerationRequest::new("prompt", 5)
            .with_reference_image("/definitely/not/here.png");
        assert!(request.reference_data_url().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_encode_image_data_url_mime() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("ref.PNG");
        tokio::fs::write(&png, b"fakepng").await.unwrap();
        let url = encode_image_data_url(&png).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let jpg = dir.path().join("ref.jpg");
        tokio::fs::write(&jpg, b"fakejpg").await.unwrap();
        let url = encode_image_data_url(&jpg).await.unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }
}
