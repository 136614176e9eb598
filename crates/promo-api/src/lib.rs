//! HTTP API for the Promoreel video generator.
//!
//! Exposes job submission (multipart image upload), progress polling,
//! video download, job history, and batch processing with zip bundling.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
