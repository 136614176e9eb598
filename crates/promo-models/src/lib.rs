//! Shared data models for the Promoreel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their lifecycle
//! - Batches of products processed under one configuration
//! - Video scripts (hook / scenes / call-to-action)
//! - Generation backend selection

pub mod backend;
pub mod batch;
pub mod job;
pub mod script;
pub mod utils;

// Re-export common types
pub use backend::{BackendKind, ParseBackendError};
pub use batch::{Batch, BatchId, BatchItem, BatchItemStatus, BatchStatus};
pub use job::{Job, JobId, JobStatus, JobStep};
pub use script::{ScriptScene, VideoScript};
pub use utils::{parse_selling_points, sanitize_product_name};
