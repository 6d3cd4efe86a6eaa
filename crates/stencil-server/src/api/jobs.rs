use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use stencil_shared::{
    timestamp_now, ConversionJob, CreateJobRequest, JobId, JobStatus, UploadStatus,
    ValidationError,
};
use tracing::info;

use super::extract::Path;
use super::{not_found, AppState};
use crate::error::ServerError;

pub(super) async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversionJob>>, ServerError> {
    Ok(Json(state.db.with(|db| db.list_jobs())?))
}

pub(super) async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<ConversionJob>, ServerError> {
    let job = state
        .db
        .with(|db| db.get_job(id))
        .map_err(not_found("Job not found"))?;
    Ok(Json(job))
}

pub(super) async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversionJob>), ServerError> {
    let Json(req) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let upload = state
        .db
        .with(|db| db.get_upload(req.upload))
        .map_err(not_found("Upload not found."))?;

    if upload.status != UploadStatus::Ready {
        return Err(ValidationError::UploadNotReady {
            id: upload.id,
            status: upload.status,
        }
        .into());
    }

    let now = timestamp_now();
    let job = ConversionJob {
        id: JobId::new(),
        upload_id: upload.id,
        upload_title: upload.title,
        target: req.target,
        status: JobStatus::Queued,
        log: String::new(),
        artifact: None,
        created_at: now,
        updated_at: now,
    };
    state.db.with(|db| db.insert_job(&job))?;
    state.worker.wake();

    info!(job = %job.id, upload = %job.upload_id, target = %job.target, "Conversion queued");
    Ok((StatusCode::CREATED, Json(job)))
}
