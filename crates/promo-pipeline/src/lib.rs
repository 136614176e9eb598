//! Pipeline orchestration for single jobs and batches.
//!
//! The `Orchestrator` owns the collaborators (vision, script writer,
//! video backends, post-processor) behind trait objects and drives each
//! job or batch in its own spawned task, writing state through the job
//! store at every transition.

pub mod batch;
pub mod bundle;
pub mod config;
pub mod error;
pub mod orchestrator;

#[cfg(test)]
mod testsupport;

pub use bundle::create_zip;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{BackendFactory, Orchestrator};
