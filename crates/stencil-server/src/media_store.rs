use std::path::{Component, Path, PathBuf};

use stencil_shared::constants::MEDIA_PREFIX;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// Top-level directories under the media root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Screenshots received from clients.
    Upload,
    /// Archives produced by conversion jobs.
    Build,
    /// Archives copied into the library.
    Library,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Upload, MediaKind::Build, MediaKind::Library];

    pub fn dir(self) -> &'static str {
        match self {
            MediaKind::Upload => "uploads",
            MediaKind::Build => "builds",
            MediaKind::Library => "library",
        }
    }

    fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dir() == dir)
    }
}

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(base)
        .unwrap_or(target)
        .components()
    {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::ParentDir => {
                return Err(ServerError::BadRequest("Path traversal detected".to_string()));
            }
            _ => {}
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ServerError::BadRequest("Path traversal detected".to_string()));
    }
    Ok(resolved)
}

fn check_file_name(name: &str) -> Result<(), ServerError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ServerError::BadRequest(format!("Invalid media file name: {name}")));
    }
    Ok(())
}

/// Files on disk addressed by `/media/<kind>/<file>` references.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub async fn new(root: PathBuf) -> Result<Self, ServerError> {
        for kind in MediaKind::ALL {
            let dir = root.join(kind.dir());
            fs::create_dir_all(&dir).await.map_err(|e| {
                ServerError::Media(format!(
                    "Failed to create media directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        info!(path = %root.display(), "Media store initialized");
        Ok(Self { root })
    }

    /// The public reference for a stored file.
    pub fn reference(kind: MediaKind, file_name: &str) -> String {
        format!("{MEDIA_PREFIX}/{}/{}", kind.dir(), file_name)
    }

    /// Map a `/media/...` reference (or the part after `/media/`) to a path on disk.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ServerError> {
        let relative = reference
            .strip_prefix(MEDIA_PREFIX)
            .unwrap_or(reference)
            .trim_start_matches('/');

        let (dir, name) = relative
            .split_once('/')
            .ok_or_else(|| ServerError::MediaNotFound(reference.to_string()))?;
        let kind = MediaKind::from_dir(dir)
            .ok_or_else(|| ServerError::MediaNotFound(reference.to_string()))?;
        check_file_name(name)?;

        ensure_within(&self.root, &self.root.join(kind.dir()).join(name))
    }

    pub async fn store(
        &self,
        kind: MediaKind,
        file_name: &str,
        data: &[u8],
    ) -> Result<String, ServerError> {
        check_file_name(file_name)?;
        let reference = Self::reference(kind, file_name);
        let path = self.resolve(&reference)?;

        fs::write(&path, data)
            .await
            .map_err(|e| ServerError::Media(format!("Failed to write {reference}: {e}")))?;

        debug!(reference = %reference, size = data.len(), "Stored media file");
        Ok(reference)
    }

    pub async fn read(&self, reference: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.resolve(reference)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServerError::MediaNotFound(reference.to_string()))
            }
            Err(e) => Err(ServerError::Media(format!("Failed to read {reference}: {e}"))),
        }
    }

    /// Copy an existing file to `kind/file_name`, returning the new reference.
    pub async fn copy(
        &self,
        reference: &str,
        kind: MediaKind,
        file_name: &str,
    ) -> Result<String, ServerError> {
        let data = self.read(reference).await?;
        self.store(kind, file_name, &data).await
    }

    /// Remove a file. Returns `false` if it was already gone.
    pub async fn remove(&self, reference: &str) -> Result<bool, ServerError> {
        let path = self.resolve(reference)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(reference = %reference, "Deleted media file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerError::Media(format!("Failed to delete {reference}: {e}"))),
        }
    }
}
