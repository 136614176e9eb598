//! Script and render-prompt generation.

use async_trait::async_trait;
use promo_models::VideoScript;
use tracing::{info, warn};

use crate::client::{ChatMessage, OpenAiClient};
use crate::error::AiResult;
use crate::json::extract_json;

/// Seam for the script writing step.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Produce a structured video script for the product.
    async fn generate_script(
        &self,
        product_name: &str,
        description: &str,
        selling_points: &[String],
        duration_secs: u32,
    ) -> AiResult<VideoScript>;

    /// Turn the script into a single render prompt for the video backend.
    async fn generate_prompt(&self, description: &str, script: &VideoScript) -> AiResult<String>;
}

const SCRIPT_SYSTEM_PROMPT: &str = "You are a short-form video scriptwriter for e-commerce ads. \
Respond with JSON only, exactly this shape: \
{\"hook\": \"opening line\", \"scenes\": [{\"duration\": 3.0, \
\"description\": \"what the camera shows\", \"text\": \"on-screen caption\"}], \
\"cta\": \"closing call to action\"}. \
Keep captions under 8 words and make the scene durations sum to the requested length.";

const PROMPT_SYSTEM_PROMPT: &str = "You are a prompt engineer for an image-to-video model. \
Given a product description and a shot list, write one flowing English prompt describing \
the full video: camera movement, lighting, pacing. Vertical 9:16 format. \
Respond with the prompt text only, no preamble.";

pub struct OpenAiScriptWriter {
    client: OpenAiClient,
}

impl OpenAiScriptWriter {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScriptWriter for OpenAiScriptWriter {
    async fn generate_script(
        &self,
        product_name: &str,
        description: &str,
        selling_points: &[String],
        duration_secs: u32,
    ) -> AiResult<VideoScript> {
        let mut request = format!(
            "Product: {product_name}\nDescription: {description}\n\
             Target length: {duration_secs} seconds\n"
        );
        if !selling_points.is_empty() {
            request.push_str("Selling points:\n");
            for point in selling_points {
                request.push_str("- ");
                request.push_str(point);
                request.push('\n');
            }
        }

        let messages = [
            ChatMessage::system(SCRIPT_SYSTEM_PROMPT),
            ChatMessage::user(request),
        ];
        let text = self.client.chat(&messages, 0.8, 900).await?;

        let script = extract_json(&text)
            .and_then(|value| serde_json::from_value::<VideoScript>(value).ok())
            .unwrap_or_else(|| {
                warn!("Script reply was not valid JSON, using fallback script");
                VideoScript::fallback(duration_secs, description)
            });
        info!(
            "Script generated: {} scenes, {:.1}s",
            script.scenes.len(),
            script.total_duration()
        );
        Ok(script)
    }

    async fn generate_prompt(&self, description: &str, script: &VideoScript) -> AiResult<String> {
        let mut shot_list = String::new();
        for (i, scene) in script.scenes.iter().enumerate() {
            shot_list.push_str(&format!(
                "{}. ({:.1}s) {}\n",
                i + 1,
                scene.duration,
                scene.description
            ));
        }
        let request = format!(
            "Product: {description}\nHook: {}\nShot list:\n{shot_list}CTA: {}",
            script.hook, script.cta
        );

        let messages = [
            ChatMessage::system(PROMPT_SYSTEM_PROMPT),
            ChatMessage::user(request),
        ];
        let prompt = self.client.chat(&messages, 0.7, 500).await?;
        Ok(prompt.trim().to_string())
    }
}
