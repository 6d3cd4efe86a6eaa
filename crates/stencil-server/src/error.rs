use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stencil_shared::{ErrorBody, ValidationError};
use stencil_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Media file not found: {0}")]
    MediaNotFound(String),

    #[error("Media storage error: {0}")]
    Media(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) | ServerError::MediaNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Validation(ValidationError::ImageTooLarge { .. })
            | ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Validation(ValidationError::UnsupportedImageType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::Media(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match self {
                ServerError::Store(_) => "Database error".to_string(),
                ServerError::Media(_) => "Media storage error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            match self {
                ServerError::Store(StoreError::NotFound) => "Not found".to_string(),
                other => other.to_string(),
            }
        };

        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::NotFound("Upload not found.".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Validation(ValidationError::ImageTooLarge { size: 2, max: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ServerError::Validation(ValidationError::UnsupportedImageType("Gif".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ServerError::Validation(ValidationError::EmptyName).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Store(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Store(StoreError::Migration("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
