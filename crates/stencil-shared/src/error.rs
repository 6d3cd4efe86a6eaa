use thiserror::Error;

use crate::types::{UploadId, UploadStatus};

/// A precondition that can be checked without talking to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Library name must not be empty")]
    EmptyName,

    #[error("{field} is too long: {len} characters (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Image is empty")]
    EmptyImage,

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Unsupported image type: {0} (expected PNG, JPEG or WebP)")]
    UnsupportedImageType(String),

    #[error("Upload {id} is {status}; only READY uploads can be converted")]
    UploadNotReady { id: UploadId, status: UploadStatus },

    #[error("Unknown target: {0}")]
    UnknownTarget(String),
}
