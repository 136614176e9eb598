//! Batch handlers: submit, poll, zip download.

use axum::extract::{Path as UrlPath, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use promo_models::{BackendKind, Batch, BatchId, BatchItem};
use promo_pipeline::create_zip;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize, Serialize)]
pub struct BatchItemRequest {
    pub product_name: String,
    #[serde(default)]
    pub selling_points: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct CreateBatchRequest {
    #[validate(length(min = 1, max = 50, message = "between 1 and 50 products per batch"))]
    pub items: Vec<BatchItemRequest>,
    #[serde(default)]
    pub video_service: Option<String>,
    #[serde(default)]
    pub add_subtitle: bool,
    #[serde(default)]
    pub add_bgm: bool,
    #[serde(default)]
    pub reference_image_path: String,
}

#[derive(Serialize)]
pub struct CreateBatchResponse {
    pub batch_id: String,
    pub total: u32,
}

/// POST /api/batch
pub async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<CreateBatchRequest>,
) -> ApiResult<Json<CreateBatchResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let backend: BackendKind = match request.video_service.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|e| ApiError::bad_request(format!("{e}")))?,
        None => BackendKind::default(),
    };

    // Items with a blank product name are dropped; points are trimmed.
    let items: Vec<BatchItem> = request
        .items
        .into_iter()
        .filter(|item| !item.product_name.trim().is_empty())
        .map(|item| {
            let points = item
                .selling_points
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            BatchItem::new(item.product_name.trim(), points)
        })
        .collect();
    if items.is_empty() {
        return Err(ApiError::bad_request("Please provide at least one product"));
    }

    let batch = Batch::new(
        items,
        backend,
        request.add_subtitle,
        request.add_bgm,
        request.reference_image_path,
    );
    let batch_id = batch.batch_id.clone();
    let total = batch.total();

    state.batches().insert(batch).await;
    state.orchestrator.spawn_batch(batch_id.clone());
    info!(batch_id = %batch_id, total, "Batch accepted");

    Ok(Json(CreateBatchResponse {
        batch_id: batch_id.to_string(),
        total,
    }))
}

#[derive(Serialize)]
pub struct BatchItemView {
    pub item_id: String,
    pub product_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub has_video: bool,
}

#[derive(Serialize)]
pub struct BatchView {
    pub batch_id: String,
    pub status: &'static str,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub items: Vec<BatchItemView>,
}

/// GET /api/batch/:batch_id
pub async fn get_batch(
    State(state): State<AppState>,
    UrlPath(batch_id): UrlPath<String>,
) -> ApiResult<Json<BatchView>> {
    let batch = state
        .batches()
        .get(&BatchId::from_string(batch_id))
        .await
        .ok_or_else(|| ApiError::not_found("Batch not found"))?;

    Ok(Json(BatchView {
        batch_id: batch.batch_id.to_string(),
        status: batch.status.as_str(),
        total: batch.total(),
        completed: batch.completed,
        failed: batch.failed,
        items: batch
            .items
            .into_iter()
            .map(|item| BatchItemView {
                item_id: item.item_id,
                product_name: item.product_name,
                status: item.status.as_str(),
                error: item.error,
                has_video: !item.video_path.is_empty(),
            })
            .collect(),
    }))
}

/// GET /api/batch/:batch_id/download
pub async fn download_batch(
    State(state): State<AppState>,
    UrlPath(batch_id): UrlPath<String>,
) -> ApiResult<Response> {
    let batch = state
        .batches()
        .get(&BatchId::from_string(batch_id))
        .await
        .ok_or_else(|| ApiError::not_found("Batch not found"))?;

    let zip_dir = state.orchestrator.config().zip_dir();
    let zip_path = tokio::task::spawn_blocking(move || create_zip(&batch, &zip_dir))
        .await
        .map_err(|e| ApiError::internal(format!("bundling task failed: {e}")))??
        .ok_or_else(|| ApiError::bad_request("No finished videos in this batch"))?;

    let bytes = tokio::fs::read(&zip_path)
        .await
        .map_err(|e| ApiError::internal(format!("cannot read archive: {e}")))?;

    let filename = zip_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "batch.zip".to_string());
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
