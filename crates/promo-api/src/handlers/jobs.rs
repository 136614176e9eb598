//! Single-job handlers: submit, poll, download, history.

use std::path::Path;

use axum::extract::{Multipart, Path as UrlPath, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use promo_models::{
    parse_selling_points, sanitize_product_name, BackendKind, Job, JobId, JobStatus,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_SELLING_POINTS: usize = 10;

#[derive(Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// One parsed multipart submission.
struct GenerateForm {
    image_bytes: Vec<u8>,
    image_suffix: String,
    product_name: String,
    selling_points: Vec<String>,
    backend: BackendKind,
    add_subtitle: bool,
    add_bgm: bool,
}

async fn parse_generate_form(mut multipart: Multipart) -> ApiResult<GenerateForm> {
    let mut image_bytes = None;
    let mut image_suffix = ".jpg".to_string();
    let mut product_name = String::new();
    let mut selling_points = Vec::new();
    let mut backend = BackendKind::default();
    let mut add_subtitle = false;
    let mut add_bgm = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request(
                        "Please upload an image file (JPG/PNG)",
                    ));
                }
                if let Some(suffix) = field
                    .file_name()
                    .and_then(|n| Path::new(n).extension())
                    .and_then(|e| e.to_str())
                {
                    image_suffix = format!(".{suffix}");
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("cannot read image: {e}")))?;
                image_bytes = Some(bytes.to_vec());
            }
            "product_name" => {
                product_name = field.text().await.unwrap_or_default().trim().to_string();
            }
            "selling_points" => {
                selling_points = parse_selling_points(&field.text().await.unwrap_or_default());
            }
            "video_service" => {
                let raw = field.text().await.unwrap_or_default();
                backend = raw
                    .parse()
                    .map_err(|e| ApiError::bad_request(format!("{e}")))?;
            }
            "add_subtitle" => add_subtitle = parse_flag(&field.text().await.unwrap_or_default()),
            "add_bgm" => add_bgm = parse_flag(&field.text().await.unwrap_or_default()),
            _ => {}
        }
    }

    let image_bytes =
        image_bytes.ok_or_else(|| ApiError::bad_request("Please upload an image file (JPG/PNG)"))?;
    if product_name.is_empty() {
        return Err(ApiError::bad_request("Product name is required"));
    }
    if selling_points.is_empty() {
        return Err(ApiError::bad_request("Please provide at least one selling point"));
    }
    if selling_points.len() > MAX_SELLING_POINTS {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_SELLING_POINTS} selling points are allowed"
        )));
    }

    Ok(GenerateForm {
        image_bytes,
        image_suffix,
        product_name,
        selling_points,
        backend,
        add_subtitle,
        add_bgm,
    })
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "true" | "1" | "on")
}

/// POST /api/generate
pub async fn create_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CreateJobResponse>> {
    let form = parse_generate_form(multipart).await?;

    let job = Job::new(
        &form.product_name,
        form.backend,
        form.add_subtitle,
        form.add_bgm,
    );

    // Stage the upload; the pipeline removes it when done.
    let upload_dir = state.orchestrator.config().upload_dir();
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("cannot create upload dir: {e}")))?;
    let image_path = upload_dir.join(format!("{}{}", job.id, form.image_suffix));
    tokio::fs::write(&image_path, &form.image_bytes)
        .await
        .map_err(|e| ApiError::internal(format!("cannot stage upload: {e}")))?;

    state.store().save(&job).await?;
    info!(job_id = %job.id, product = %job.product_name, "Job accepted");

    let job_id = job.id.to_string();
    state
        .orchestrator
        .spawn_job(job, image_path, form.selling_points);

    Ok(Json(CreateJobResponse { job_id }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub step: u8,
    pub step_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub product_name: String,
}

/// GET /api/status/:job_id
///
/// Deliberately omits filesystem paths.
pub async fn get_status(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job = state
        .store()
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(StatusResponse {
        status: job.status.as_str(),
        step: job.step.index(),
        step_name: job.step.label(),
        error: job.error,
        product_name: job.product_name,
    }))
}

/// GET /api/download/:job_id
pub async fn download_video(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> ApiResult<Response> {
    let job = state
        .store()
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.status != JobStatus::Success {
        return Err(ApiError::bad_request("Video is not ready yet"));
    }
    let video_path = job
        .video_path
        .as_deref()
        .ok_or_else(|| ApiError::not_found("Video file no longer exists"))?;

    let bytes = tokio::fs::read(video_path)
        .await
        .map_err(|_| ApiError::not_found("Video file no longer exists"))?;

    let filename = format!("{}.mp4", sanitize_product_name(&job.product_name));
    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub product_name: String,
    pub status: &'static str,
    pub step: u8,
    pub step_name: &'static str,
    pub video_service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub has_video: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// GET /api/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<JobSummary>>> {
    let limit = query.limit.unwrap_or(50).min(200);
    let jobs = state.store().list(limit).await?;

    Ok(Json(
        jobs.into_iter()
            .map(|job| JobSummary {
                job_id: job.id.to_string(),
                product_name: job.product_name,
                status: job.status.as_str(),
                step: job.step.index(),
                step_name: job.step.label(),
                video_service: job.backend.as_str(),
                error: job.error,
                has_video: job.video_path.is_some(),
                created_at: job.created_at.to_rfc3339(),
                updated_at: job.updated_at.to_rfc3339(),
            })
            .collect(),
    ))
}

/// DELETE /api/jobs/:job_id
pub async fn delete_job(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = JobId::from_string(job_id);
    let deleted = state.store().delete(&id).await?;
    if !deleted {
        return Err(ApiError::not_found("Job not found"));
    }

    let output_dir = state.orchestrator.config().output_dir.join(id.as_str());
    let _ = tokio::fs::remove_dir_all(&output_dir).await;
    info!(job_id = %id, "Job deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
