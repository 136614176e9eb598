//! AI collaborators for the generation pipeline.
//!
//! This crate provides the two stateless request/response steps the
//! orchestrator calls out to:
//! - `ProductVision`: analyze a product photo and produce a description
//!   plus a white-background reference image
//! - `ScriptWriter`: turn product info and selling points into a video
//!   script and a render prompt
//!
//! Both are backed by an OpenAI-style chat/images HTTP API; traits sit at
//! the seam so the pipeline can be tested with fakes.

pub mod client;
pub mod error;
pub mod json;
pub mod script;
pub mod vision;

pub use client::{AiConfig, OpenAiClient};
pub use error::{AiError, AiResult};
pub use json::extract_json;
pub use script::{OpenAiScriptWriter, ScriptWriter};
pub use vision::{OpenAiVision, ProductVision, VisionOutcome};
