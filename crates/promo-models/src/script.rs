//! Video script types produced by the script generator.

use serde::{Deserialize, Serialize};

/// One shot in the generated video script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptScene {
    /// Shot length in seconds
    #[serde(default = "default_scene_duration")]
    pub duration: f64,
    /// Visual description of the shot
    pub description: String,
    /// On-screen caption text
    #[serde(default)]
    pub text: String,
}

fn default_scene_duration() -> f64 {
    3.0
}

/// A short-form marketing video script: hook, shot list, call-to-action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoScript {
    /// Attention-grabbing opening line
    #[serde(default)]
    pub hook: String,
    /// Ordered shot list
    #[serde(default)]
    pub scenes: Vec<ScriptScene>,
    /// Closing call-to-action line
    #[serde(default)]
    pub cta: String,
}

impl VideoScript {
    /// Fallback script used when the generator returns free-form text
    /// instead of the expected JSON shape.
    pub fn fallback(duration_secs: u32, body: impl Into<String>) -> Self {
        Self {
            hook: "Product showcase".to_string(),
            scenes: vec![ScriptScene {
                duration: duration_secs as f64,
                description: body.into(),
                text: String::new(),
            }],
            cta: "Buy now!".to_string(),
        }
    }

    /// Total scripted duration across all scenes, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }
}
