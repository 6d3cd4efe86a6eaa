use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use stencil_shared::validation::validate_library_name;
use stencil_shared::{timestamp_now, AddToLibraryRequest, JobStatus, LibraryItem, LibraryItemId};
use tracing::{info, warn};

use super::extract::Path;
use super::{not_found, AppState};
use crate::error::ServerError;
use crate::media_store::MediaKind;

pub(super) async fn list_library(
    State(state): State<AppState>,
) -> Result<Json<Vec<LibraryItem>>, ServerError> {
    Ok(Json(state.db.with(|db| db.list_library())?))
}

pub(super) async fn get_library_item(
    State(state): State<AppState>,
    Path(id): Path<LibraryItemId>,
) -> Result<Json<LibraryItem>, ServerError> {
    let item = state
        .db
        .with(|db| db.get_library_item(id))
        .map_err(not_found("Library item not found"))?;
    Ok(Json(item))
}

/// Copies the job's archive into the library under the item's own id.
pub(super) async fn add_to_library(
    State(state): State<AppState>,
    payload: Result<Json<AddToLibraryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LibraryItem>), ServerError> {
    let Json(req) = payload
        .map_err(|_| ServerError::BadRequest("job_id and name are required".to_string()))?;
    let name = validate_library_name(&req.name)?;

    let job = state
        .db
        .with(|db| db.get_job(req.job_id))
        .map_err(not_found("Job not found"))?;

    let artifact = match (&job.status, job.artifact.as_deref()) {
        (JobStatus::Success, Some(artifact)) => artifact,
        _ => {
            return Err(ServerError::BadRequest(
                "Job must be successful and have a zip file".to_string(),
            ))
        }
    };

    let id = LibraryItemId::new();
    let copied = state
        .media
        .copy(artifact, MediaKind::Library, &format!("{id}.zip"))
        .await?;

    let item = LibraryItem {
        id,
        name,
        target: job.target,
        artifact: copied,
        created_at: timestamp_now(),
    };

    if let Err(e) = state.db.with(|db| db.insert_library_item(&item)) {
        if let Err(cleanup) = state.media.remove(&item.artifact).await {
            warn!(error = %cleanup, artifact = %item.artifact, "Failed to remove orphaned archive");
        }
        return Err(e);
    }

    info!(item = %item.id, job = %job.id, name = %item.name, "Added to library");
    Ok((StatusCode::CREATED, Json(item)))
}

pub(super) async fn delete_library_item(
    State(state): State<AppState>,
    Path(id): Path<LibraryItemId>,
) -> Result<StatusCode, ServerError> {
    let item = state
        .db
        .with(|db| db.get_library_item(id))
        .map_err(not_found("Library item not found"))?;

    if !state.db.with(|db| db.delete_library_item(id))? {
        return Err(ServerError::NotFound("Library item not found".to_string()));
    }

    if let Err(e) = state.media.remove(&item.artifact).await {
        warn!(id = %id, error = %e, "Could not delete library archive");
    }

    info!(id = %id, "Library item deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn download_library_item(
    State(state): State<AppState>,
    Path(id): Path<LibraryItemId>,
) -> Result<impl IntoResponse, ServerError> {
    let item = state
        .db
        .with(|db| db.get_library_item(id))
        .map_err(not_found("Library item not found"))?;

    let data = state.media.read(&item.artifact).await?;
    let file_name = item.artifact_file_name().replace('"', "");

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        data,
    ))
}
