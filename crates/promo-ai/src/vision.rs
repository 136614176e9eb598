//! Product image analysis.
//!
//! Looks at the uploaded product photo, describes the product, and
//! produces a clean white-background reference image for the video
//! backend. If the reference image cannot be generated the original
//! photo is used instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use tracing::{info, warn};

use crate::client::{ChatMessage, OpenAiClient};
use crate::error::{AiError, AiResult};
use crate::json::extract_json;

/// What the vision step hands to the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct VisionOutcome {
    /// Product description used for script generation
    pub description: String,
    /// Reference image for the video backend
    pub reference_image: PathBuf,
}

/// Seam for the image analysis step.
#[async_trait]
pub trait ProductVision: Send + Sync {
    async fn process(&self, image_path: &Path, output_dir: &Path) -> AiResult<VisionOutcome>;
}

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a product analyst for e-commerce marketing videos. \
Look at the product photo and respond with JSON only, using exactly these keys: \
\"product_name\", \"category\", \"description\", \"white_bg_prompt\". \
\"description\" is a vivid two-sentence description of the product's look and appeal. \
\"white_bg_prompt\" is an image generation prompt that reproduces this exact product \
on a pure white studio background, vertical composition.";

pub struct OpenAiVision {
    client: OpenAiClient,
}

impl OpenAiVision {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    async fn analyze(&self, image_path: &Path) -> AiResult<(String, String)> {
        let data_url = encode_image_data_url(image_path).await?;
        let messages = [
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user_with_image("Analyze this product photo.", data_url),
        ];
        let text = self.client.chat(&messages, 0.3, 600).await?;

        match extract_json(&text) {
            Some(value) => {
                let description = value["description"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| text.trim().to_string());
                let white_bg_prompt = value["white_bg_prompt"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| description.clone());
                Ok((description, white_bg_prompt))
            }
            // Model ignored the JSON instruction; its prose still works
            // as a description and as an image prompt.
            None => {
                let text = text.trim().to_string();
                Ok((text.clone(), text))
            }
        }
    }
}

#[async_trait]
impl ProductVision for OpenAiVision {
    async fn process(&self, image_path: &Path, output_dir: &Path) -> AiResult<VisionOutcome> {
        let (description, white_bg_prompt) = self.analyze(image_path).await?;
        info!("Product analyzed: {}", truncate(&description, 80));

        let reference_image = output_dir.join("white_bg.png");
        match self.generate_reference(&white_bg_prompt, &reference_image).await {
            Ok(()) => Ok(VisionOutcome {
                description,
                reference_image,
            }),
            Err(e) => {
                warn!("Reference image generation failed, using original photo: {e}");
                Ok(VisionOutcome {
                    description,
                    reference_image: image_path.to_path_buf(),
                })
            }
        }
    }
}

impl OpenAiVision {
    async fn generate_reference(&self, prompt: &str, output_path: &Path) -> AiResult<()> {
        let url = self.client.generate_image(prompt, "1024x1792").await?;
        self.client.download_image(&url, output_path).await
    }
}

/// Read an image file and encode it as a base64 data URL.
async fn encode_image_data_url(image_path: &Path) -> AiResult<String> {
    let bytes = tokio::fs::read(image_path).await.map_err(|e| {
        AiError::request(format!("cannot read image {}: {e}", image_path.display()))
    })?;
    let mime = match image_path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        _ => "image/jpeg",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AiConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vision(server: &MockServer) -> OpenAiVision {
        OpenAiVision::new(
            OpenAiClient::new(AiConfig {
                api_url: server.uri(),
                api_key: "sk-test".to_string(),
                ..AiConfig::default()
            })
            .unwrap(),
        )
    }

    fn chat_reply() -> serde_json::Value {
        serde_json::json!({
            "choices": [ { "message": { "content":
                "```json\n{\"product_name\": \"Mug\", \"category\": \"kitchen\", \
                 \"description\": \"A glossy blue ceramic mug.\", \
                 \"white_bg_prompt\": \"blue mug on white\"}\n```"
            } } ]
        })
    }

    #[tokio::test]
    async fn test_process_writes_reference_image() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.jpg");
        tokio::fs::write(&photo, b"jpegdata").await.unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [ { "url": format!("{}/white.png", server.uri()) } ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/white.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pngdata".to_vec()))
            .mount(&server)
            .await;

        let out = vision(&server)
            .process(&photo, dir.path())
            .await
            .unwrap();
        assert_eq!(out.description, "A glossy blue ceramic mug.");
        assert_eq!(out.reference_image, dir.path().join("white_bg.png"));
        assert_eq!(
            tokio::fs::read(&out.reference_image).await.unwrap(),
            b"pngdata"
        );
    }

    #[tokio::test]
    async fn test_reference_failure_falls_back_to_original() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        tokio::fs::write(&photo, b"pngdata").await.unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = vision(&server)
            .process(&photo, dir.path())
            .await
            .unwrap();
        assert_eq!(out.reference_image, photo);
    }

    #[tokio::test]
    async fn test_analysis_failure_is_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.jpg");
        tokio::fs::write(&photo, b"jpegdata").await.unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(vision(&server).process(&photo, dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_non_json_reply_becomes_description() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.jpg");
        tokio::fs::write(&photo, b"jpegdata").await.unwrap();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "A sleek water bottle." } } ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = vision(&server)
            .process(&photo, dir.path())
            .await
            .unwrap();
        assert_eq!(out.description, "A sleek water bottle.");
    }
}
