//! Screenshot to template-pack conversion.
//!
//! A [`Converter`] turns an uploaded screenshot into a set of generated files.
//! The worker packs those files into a zip archive with [`pack_zip`] and, on
//! failure, records [`ConvertError::failure_log`] in the job log.

mod scaffold;

use std::io::{Cursor, Write};

use stencil_shared::Target;
use thiserror::Error;

pub use scaffold::ScaffoldConverter;

/// Everything a converter needs for one job.
#[derive(Debug, Clone)]
pub struct ConversionInput {
    pub title: String,
    pub target: Target,
    pub image: Vec<u8>,
}

/// One file of a generated pack, addressed by its path inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub contents: Vec<u8>,
}

impl GeneratedFile {
    pub fn text(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into().into_bytes(),
        }
    }
}

pub trait Converter: Send + Sync {
    fn convert(&self, input: &ConversionInput) -> Result<Vec<GeneratedFile>, ConvertError>;
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Image file not found: {0}")]
    MissingImage(String),

    #[error("Unicode encoding error: {0}")]
    Encoding(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to create zip file: {0}")]
    Archive(String),

    #[error("Template conversion failed: {0}")]
    Failed(String),
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::MissingImage(e.to_string()),
            std::io::ErrorKind::PermissionDenied => ConvertError::Permission(e.to_string()),
            std::io::ErrorKind::InvalidData => ConvertError::Encoding(e.to_string()),
            _ => ConvertError::Failed(e.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(e: zip::result::ZipError) -> Self {
        ConvertError::Archive(e.to_string())
    }
}

impl ConvertError {
    /// Headline shown to users, prefixed with the failure class.
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::Encoding(_) => "ENCODING ERROR: The template contains characters \
                 that could not be encoded in the generated files."
                .to_string(),
            ConvertError::MissingImage(_) => {
                "FILE ERROR: The uploaded image file could not be found or accessed.".to_string()
            }
            ConvertError::Permission(_) => {
                "PERMISSION ERROR: Unable to write template files. Check file system permissions."
                    .to_string()
            }
            other => format!("CONVERSION ERROR: {other}"),
        }
    }

    /// Full job log for a failed conversion.
    pub fn failure_log(&self) -> String {
        format!("{}\n\nTechnical Details:\n{}", self.user_message(), self)
    }
}

/// Log recorded on a successful conversion.
pub fn success_log(target: Target, file_count: usize) -> String {
    format!(
        "Conversion completed successfully!\n\n\
         Generated {} template pack ({file_count} files)\n\
         Template files: Ready for download\n\
         Based on uploaded image analysis",
        target.label()
    )
}

/// Pack generated files into a deflate-compressed zip archive.
pub fn pack_zip(files: &[GeneratedFile]) -> Result<Vec<u8>, ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::Failed("converter produced no files".to_string()));
    }

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        writer.start_file(file.path.clone(), options)?;
        writer.write_all(&file.contents)?;
    }

    Ok(writer.finish()?.into_inner())
}
