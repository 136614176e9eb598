//! Video generation backend adapters.
//!
//! This crate provides:
//! - A uniform `VideoBackend` capability (submit / poll / fetch) over the
//!   two interchangeable generation services
//! - `SeedanceBackend`: direct-connect image-to-video, short clips
//! - `CreatokBackend`: general-purpose text-to-video, longer clips
//! - A fixed-interval completion waiter driving a task to a terminal outcome

pub mod backend;
pub mod creatok;
pub mod download;
pub mod error;
pub mod seedance;
pub mod waiter;

pub use backend::{GenerationRequest, PollStatus, TaskHandle, VideoBackend};
pub use creatok::{CreatokBackend, CreatokConfig};
pub use error::{VideogenError, VideogenResult};
pub use seedance::{SeedanceBackend, SeedanceConfig};
pub use waiter::{wait_for_completion, WaitConfig, WaitOutcome};

use promo_models::BackendKind;

/// Construct the adapter for a backend choice, configured from the
/// environment.
pub fn backend_from_env(kind: BackendKind) -> VideogenResult<Box<dyn VideoBackend>> {
    match kind {
        BackendKind::Seedance => Ok(Box::new(SeedanceBackend::new(SeedanceConfig::from_env())?)),
        BackendKind::Creatok => Ok(Box::new(CreatokBackend::new(CreatokConfig::from_env())?)),
    }
}
