//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::batches::{create_batch, download_batch, get_batch};
use crate::handlers::health;
use crate::handlers::jobs::{create_job, delete_job, download_video, get_status, list_jobs};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    let api_routes = Router::new()
        // Single jobs
        .route("/generate", post(create_job))
        .route("/status/:job_id", get(get_status))
        .route("/download/:job_id", get(download_video))
        // History
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", delete(delete_job))
        // Batches
        .route("/batch", post(create_batch))
        .route("/batch/:batch_id", get(get_batch))
        .route("/batch/:batch_id/download", get(download_batch));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    }
}
