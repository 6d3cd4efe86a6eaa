//! The seam between the orchestrator and whatever stores the collections.

use async_trait::async_trait;
use stencil_shared::validation::{validate_screenshot, validate_title, ImageKind};
use stencil_shared::{
    ConversionJob, JobId, LibraryItem, LibraryItemId, Target, Upload, UploadId, ValidationError,
};

use crate::error::Result;

/// A screenshot that already passed client-side validation.
#[derive(Debug, Clone)]
pub struct NewUpload {
    title: String,
    notes: String,
    image: Vec<u8>,
    kind: ImageKind,
    file_name: String,
}

impl NewUpload {
    /// Checks encoding, size (10 MiB) and title before anything is sent.
    pub fn new(image: Vec<u8>, title: &str, notes: &str) -> std::result::Result<Self, ValidationError> {
        let kind = validate_screenshot(&image)?;
        let title = validate_title(title)?;
        Ok(Self {
            title,
            notes: notes.trim().to_string(),
            file_name: format!("screenshot.{}", kind.extension()),
            image,
            kind,
        })
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn into_image(self) -> Vec<u8> {
        self.image
    }
}

#[async_trait]
pub trait TemplateBackend: Send + Sync {
    async fn list_uploads(&self) -> Result<Vec<Upload>>;

    async fn create_upload(&self, upload: NewUpload) -> Result<Upload>;

    async fn delete_upload(&self, id: UploadId) -> Result<()>;

    async fn list_jobs(&self) -> Result<Vec<ConversionJob>>;

    async fn create_job(&self, upload: UploadId, target: Target) -> Result<ConversionJob>;

    async fn list_library(&self) -> Result<Vec<LibraryItem>>;

    async fn add_to_library(&self, job: JobId, name: &str) -> Result<LibraryItem>;

    async fn delete_library_item(&self, id: LibraryItemId) -> Result<()>;

    /// Bytes behind an artifact reference (`/media/...` or absolute URL).
    async fn fetch_artifact(&self, reference: &str) -> Result<Vec<u8>>;
}
