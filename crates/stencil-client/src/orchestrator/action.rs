use std::path::PathBuf;

use stencil_shared::{
    ConversionJob, JobId, JobStatus, LibraryItem, LibraryItemId, Target, Upload, UploadId,
};
use tracing::warn;

use super::Orchestrator;
use crate::backend::NewUpload;
use crate::error::Result;
use crate::notice::Notice;
use crate::state::ArtifactSource;

/// A user-initiated operation.
#[derive(Debug, Clone)]
pub enum Action {
    Refresh,
    Upload {
        image: Vec<u8>,
        title: String,
        notes: String,
        file_name: Option<String>,
    },
    Convert {
        upload: UploadId,
        target: Target,
    },
    Promote {
        job: JobId,
        name: String,
    },
    DeleteUpload(UploadId),
    DeleteLibraryItem(LibraryItemId),
    Watch(JobId),
    Download {
        source: ArtifactSource,
        dir: PathBuf,
    },
}

impl Action {
    fn failure_headline(&self) -> &'static str {
        match self {
            Action::Refresh => "Failed to load templates",
            Action::Upload { .. } => "Upload failed",
            Action::Convert { .. } => "Could not start conversion",
            Action::Promote { .. } => "Could not add to library",
            Action::DeleteUpload(_) => "Could not delete upload",
            Action::DeleteLibraryItem(_) => "Could not delete library item",
            Action::Watch(_) => "Could not check job status",
            Action::Download { .. } => "Download failed",
        }
    }
}

/// Outcome of a successful [`Action`].
#[derive(Debug, Clone)]
pub enum Completed {
    Refreshed {
        uploads: usize,
        jobs: usize,
        library: usize,
    },
    Uploaded(Upload),
    Queued(ConversionJob),
    Promoted(LibraryItem),
    UploadDeleted(UploadId),
    LibraryItemDeleted(LibraryItemId),
    Watched(ConversionJob),
    Downloaded(PathBuf),
}

impl Completed {
    pub fn notice(&self) -> Notice {
        match self {
            Completed::Refreshed {
                uploads,
                jobs,
                library,
            } => Notice::info(format!(
                "{uploads} uploads, {jobs} jobs, {library} library items"
            )),
            Completed::Uploaded(upload) => Notice::success(format!(
                "Uploaded \"{}\". Processing has started.",
                upload.title
            )),
            Completed::Queued(job) => Notice::success(format!(
                "{} conversion of \"{}\" queued.",
                job.target.label(),
                job.upload_title
            )),
            Completed::Promoted(item) => {
                Notice::success(format!("Added \"{}\" to the library.", item.name))
            }
            Completed::UploadDeleted(_) => Notice::success("Upload deleted."),
            Completed::LibraryItemDeleted(_) => Notice::success("Library item deleted."),
            Completed::Watched(job) => match job.status {
                JobStatus::Success => Notice::success(format!(
                    "{} conversion of \"{}\" completed.",
                    job.target.label(),
                    job.upload_title
                )),
                JobStatus::Error => Notice::error(format!(
                    "{} conversion of \"{}\" failed: {}",
                    job.target.label(),
                    job.upload_title,
                    job.log.lines().next().unwrap_or("no details")
                )),
                status => Notice::info(format!(
                    "{} conversion of \"{}\" is still {status}.",
                    job.target.label(),
                    job.upload_title
                )),
            },
            Completed::Downloaded(path) => Notice::success(format!("Saved {}", path.display())),
        }
    }
}

impl Orchestrator {
    /// Run an action and turn any failure into a user-facing notice.
    pub async fn dispatch(&self, action: Action) -> std::result::Result<Completed, Notice> {
        let headline = action.failure_headline();
        self.run(action).await.map_err(|e| {
            warn!(error = %e, "{headline}");
            Notice::failure(headline, &e)
        })
    }

    async fn run(&self, action: Action) -> Result<Completed> {
        match action {
            Action::Refresh => {
                self.refresh().await?;
                let snapshot = self.snapshot();
                Ok(Completed::Refreshed {
                    uploads: snapshot.uploads.len(),
                    jobs: snapshot.jobs.len(),
                    library: snapshot.library.len(),
                })
            }
            Action::Upload {
                image,
                title,
                notes,
                file_name,
            } => {
                let mut upload = NewUpload::new(image, &title, &notes)?;
                if let Some(file_name) = file_name {
                    upload = upload.with_file_name(file_name);
                }
                self.create_upload(upload).await.map(Completed::Uploaded)
            }
            Action::Convert { upload, target } => {
                self.convert(upload, target).await.map(Completed::Queued)
            }
            Action::Promote { job, name } => self
                .add_to_library(job, &name)
                .await
                .map(Completed::Promoted),
            Action::DeleteUpload(id) => {
                self.delete_upload(id).await?;
                Ok(Completed::UploadDeleted(id))
            }
            Action::DeleteLibraryItem(id) => {
                self.delete_library_item(id).await?;
                Ok(Completed::LibraryItemDeleted(id))
            }
            Action::Watch(id) => self
                .watch_job(id, self.poll_interval, self.max_polls)
                .await
                .map(Completed::Watched),
            Action::Download { source, dir } => self
                .download_artifact(source, &dir)
                .await
                .map(Completed::Downloaded),
        }
    }
}
