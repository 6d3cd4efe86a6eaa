//! # stencil-shared
//!
//! Types shared by the Stencil backend and client: entity identifiers and
//! status enums, the JSON wire models for uploads, conversion jobs and
//! library items, client-side validation, and artifact naming.

pub mod artifact;
pub mod constants;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use models::{
    timestamp_now, AddToLibraryRequest, ConversionJob, CreateJobRequest, ErrorBody, LibraryItem,
    Upload,
};
pub use types::{JobId, JobStatus, LibraryItemId, Target, UploadId, UploadStatus};
