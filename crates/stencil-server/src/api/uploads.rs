use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use stencil_shared::validation::{validate_image, validate_title};
use stencil_shared::{timestamp_now, Upload, UploadId, UploadStatus};
use tracing::{debug, info, warn};

use super::extract::Path;
use super::{not_found, AppState};
use crate::error::ServerError;
use crate::media_store::MediaKind;

fn multipart_error(e: MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

fn file_stem(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

pub(super) async fn list_uploads(
    State(state): State<AppState>,
) -> Result<Json<Vec<Upload>>, ServerError> {
    Ok(Json(state.db.with(|db| db.list_uploads())?))
}

pub(super) async fn get_upload(
    State(state): State<AppState>,
    Path(id): Path<UploadId>,
) -> Result<Json<Upload>, ServerError> {
    let upload = state
        .db
        .with(|db| db.get_upload(id))
        .map_err(not_found("Upload not found."))?;
    Ok(Json(upload))
}

/// Multipart fields: `image` (file), `title`, `notes`.
///
/// A blank title falls back to the image's file name without extension.
pub(super) async fn create_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Upload>), ServerError> {
    let mut image = None;
    let mut title = String::new();
    let mut notes = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(file_stem).unwrap_or_default();
                let data = field.bytes().await.map_err(multipart_error)?;
                image = Some((file_name, data));
            }
            "title" => title = field.text().await.map_err(multipart_error)?,
            "notes" => notes = field.text().await.map_err(multipart_error)?,
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let (fallback_title, data) = image.ok_or_else(|| {
        ServerError::BadRequest("Missing 'image' field in multipart form".to_string())
    })?;

    let kind = validate_image(&data, state.config.max_upload_size)?;
    let title = if title.trim().is_empty() { fallback_title } else { title };
    let title = validate_title(&title)?;

    let id = UploadId::new();
    let image_ref = state
        .media
        .store(MediaKind::Upload, &format!("{id}.{}", kind.extension()), &data)
        .await?;

    let upload = Upload {
        id,
        created_at: timestamp_now(),
        title,
        image: image_ref,
        status: UploadStatus::Pending,
        notes: notes.trim().to_string(),
    };

    if let Err(e) = state.db.with(|db| db.insert_upload(&upload)) {
        if let Err(cleanup) = state.media.remove(&upload.image).await {
            warn!(error = %cleanup, image = %upload.image, "Failed to remove orphaned image");
        }
        return Err(e);
    }

    state.worker.wake();
    info!(id = %upload.id, size = data.len(), kind = kind.mime(), "Upload received");

    Ok((StatusCode::CREATED, Json(upload)))
}

/// Jobs that reference the upload are left in place.
pub(super) async fn delete_upload(
    State(state): State<AppState>,
    Path(id): Path<UploadId>,
) -> Result<StatusCode, ServerError> {
    let upload = state
        .db
        .with(|db| db.get_upload(id))
        .map_err(not_found("Upload not found."))?;

    if !state.db.with(|db| db.delete_upload(id))? {
        return Err(ServerError::NotFound("Upload not found.".to_string()));
    }

    if let Err(e) = state.media.remove(&upload.image).await {
        warn!(id = %id, error = %e, "Could not delete image file");
    }

    info!(id = %id, "Upload deleted");
    Ok(StatusCode::NO_CONTENT)
}
