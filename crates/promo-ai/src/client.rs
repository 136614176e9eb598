//! OpenAI-style HTTP client shared by the collaborators.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{AiError, AiResult};

/// Collaborator API configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API base URL
    pub api_url: String,
    /// Bearer token
    pub api_key: String,
    /// Chat/vision model
    pub chat_model: String,
    /// Image generation model
    pub image_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl AiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("OPENAI_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            chat_model: std::env::var("OPENAI_CHAT_MODEL").unwrap_or(defaults.chat_model),
            image_model: std::env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            timeout: defaults.timeout,
        }
    }
}

/// One chat message. Content is a JSON value so vision requests can send
/// an array of text/image parts.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Value,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: Value::String(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: Value::String(text.into()),
        }
    }

    /// A user message carrying text plus an inline image.
    pub fn user_with_image(text: impl Into<String>, image_data_url: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: json!([
                { "type": "text", "text": text.into() },
                { "type": "image_url", "image_url": { "url": image_data_url.into() } },
            ]),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

/// Thin client over the chat and image endpoints.
pub struct OpenAiClient {
    http: Client,
    config: AiConfig,
}

impl OpenAiClient {
    pub fn new(config: AiConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::request(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AiResult<Self> {
        Self::new(AiConfig::from_env())
    }

    /// Run a chat completion and return the first choice's text.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> AiResult<String> {
        let url = format!("{}/chat/completions", self.config.api_url);
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages,
            temperature,
            max_tokens,
        };

        debug!("Chat completion request to {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::invalid_response("empty chat completion"))
    }

    /// Generate an image and return its URL.
    pub async fn generate_image(&self, prompt: &str, size: &str) -> AiResult<String> {
        let url = format!("{}/images/generations", self.config.api_url);
        let body = ImageRequest {
            model: &self.config.image_model,
            prompt,
            size,
            quality: "hd",
            n: 1,
        };

        debug!("Image generation request to {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request(format!("status {status}: {body}")));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| AiError::invalid_response("no image url in response"))
    }

    /// Download a generated image to a local path.
    pub async fn download_image(&self, url: &str, output_path: &Path) -> AiResult<()> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AiError::ImageDownload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::ImageDownload(format!(
                "GET {url}: status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::ImageDownload(e.to_string()))?;
        tokio::fs::write(output_path, &bytes).await?;
        Ok(())
    }
}
