//! Client-side workflow coordination.
//!
//! The [`Orchestrator`] keeps a cached [`Snapshot`] of the backend's three
//! collections, issues mutating actions against a [`TemplateBackend`] and
//! reconciles the snapshot afterwards. Clones share the same session.

mod action;
mod guard;
mod watch;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stencil_shared::validation::validate_library_name;
use stencil_shared::{
    ConversionJob, JobId, LibraryItem, LibraryItemId, Target, Upload, UploadId, UploadStatus,
    ValidationError,
};
use tracing::{debug, info, warn};

use crate::backend::{NewUpload, TemplateBackend};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpBackend;
use crate::state::{Phase, SessionState, Snapshot};

pub use action::{Action, Completed};
pub use guard::ActionKey;

use guard::{lock, InFlightGuard};

#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn TemplateBackend>,
    state: Arc<Mutex<SessionState>>,
    poll_interval: Duration,
    max_polls: u32,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn TemplateBackend>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            backend,
            state: Arc::new(Mutex::new(SessionState::new())),
            poll_interval: defaults.poll_interval,
            max_polls: defaults.max_polls,
        }
    }

    /// An orchestrator talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let backend = HttpBackend::new(config)?;
        Ok(Self::new(Arc::new(backend)).with_polling(config.poll_interval, config.max_polls))
    }

    /// Polling used by [`Action::Watch`].
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        f(&mut lock(&self.state))
    }

    fn guard(&self, key: ActionKey) -> Result<InFlightGuard> {
        InFlightGuard::acquire(&self.state, key)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.with_state(|s| s.phase.clone())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.with_state(|s| s.snapshot.clone())
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.with_state(|s| s.snapshot.uploads.clone())
    }

    pub fn jobs(&self) -> Vec<ConversionJob> {
        self.with_state(|s| s.snapshot.jobs.clone())
    }

    pub fn library(&self) -> Vec<LibraryItem> {
        self.with_state(|s| s.snapshot.library.clone())
    }

    pub fn jobs_for_upload(&self, upload: UploadId) -> Vec<ConversionJob> {
        self.with_state(|s| {
            s.snapshot
                .jobs_for_upload(upload)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn is_in_flight(&self, key: &ActionKey) -> bool {
        self.with_state(|s| s.in_flight.contains(key))
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// First load of the session. Leaves the session `Failed` with empty
    /// collections when the backend cannot be reached.
    pub async fn initialize(&self) -> Result<()> {
        self.refresh().await
    }

    /// Reload all three collections concurrently and replace the snapshot.
    ///
    /// A load that finishes after a newer one has already been applied is
    /// discarded. On failure the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<()> {
        let seq = self.with_state(|s| {
            s.load_started += 1;
            if s.phase == Phase::Ready {
                s.phase = Phase::Refreshing;
            }
            s.load_started
        });

        match self.load().await {
            Ok(snapshot) => {
                let applied = self.with_state(|s| {
                    let fresher = seq > s.load_applied;
                    if fresher {
                        s.snapshot = snapshot;
                        s.load_applied = seq;
                    }
                    if seq == s.load_started {
                        s.phase = Phase::Ready;
                    }
                    fresher
                });
                if !applied {
                    debug!(seq, "Discarded stale load");
                }
                Ok(())
            }
            Err(e) => {
                self.with_state(|s| {
                    if seq == s.load_started {
                        s.phase = if s.load_applied > 0 {
                            Phase::Ready
                        } else {
                            Phase::Failed(crate::notice::describe_error(&e))
                        };
                    }
                });
                warn!(error = %e, "Failed to load templates");
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<Snapshot> {
        let (uploads, jobs, library) = tokio::try_join!(
            self.backend.list_uploads(),
            self.backend.list_jobs(),
            self.backend.list_library(),
        )?;

        for job in jobs.iter().filter(|j| !j.artifact_consistent()) {
            warn!(job = %job.id, status = %job.status, "Job artifact does not match its status");
        }
        debug!(
            uploads = uploads.len(),
            jobs = jobs.len(),
            library = library.len(),
            "Loaded templates"
        );

        Ok(Snapshot {
            uploads,
            jobs,
            library,
        })
    }

    /// Refresh after a successful mutation. A failure here does not undo
    /// the mutation.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Refresh after mutation failed");
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Submit a validated screenshot.
    pub async fn create_upload(&self, upload: NewUpload) -> Result<Upload> {
        let _guard = self.guard(ActionKey::CreateUpload(upload.title().to_string()))?;

        let created = self.backend.create_upload(upload).await?;
        info!(upload = %created.id, title = %created.title, "Uploaded screenshot");

        self.refresh_after_mutation().await;
        Ok(created)
    }

    /// Validate raw bytes and submit them.
    pub async fn upload_screenshot(
        &self,
        image: Vec<u8>,
        title: &str,
        notes: &str,
    ) -> Result<Upload> {
        let upload = NewUpload::new(image, title, notes)?;
        self.create_upload(upload).await
    }

    pub async fn delete_upload(&self, id: UploadId) -> Result<()> {
        let _guard = self.guard(ActionKey::DeleteUpload(id))?;

        self.backend.delete_upload(id).await?;
        info!(upload = %id, "Deleted upload");

        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Queue a conversion. Refused locally when the cached upload is known
    /// and not `READY`; an upload missing from the snapshot is left to the
    /// backend to judge.
    pub async fn convert(&self, upload: UploadId, target: Target) -> Result<ConversionJob> {
        let cached = self.with_state(|s| s.snapshot.upload(upload).map(|u| u.status));
        if let Some(status) = cached {
            if status != UploadStatus::Ready {
                return Err(ValidationError::UploadNotReady { id: upload, status }.into());
            }
        }

        let _guard = self.guard(ActionKey::Convert(upload, target))?;

        let job = self.backend.create_job(upload, target).await?;
        info!(job = %job.id, upload = %upload, target = %target, "Queued conversion");

        self.refresh_after_mutation().await;
        Ok(job)
    }

    /// Promote a finished job's archive under `name`.
    pub async fn add_to_library(&self, job: JobId, name: &str) -> Result<LibraryItem> {
        let name = validate_library_name(name)?;
        let _guard = self.guard(ActionKey::Promote(job))?;

        let item = self.backend.add_to_library(job, &name).await?;
        info!(item = %item.id, job = %job, name = %item.name, "Added to library");

        self.refresh_after_mutation().await;
        Ok(item)
    }

    /// Delete a library item. The item disappears from the snapshot before
    /// the request is sent and is put back if the backend refuses.
    pub async fn delete_library_item(&self, id: LibraryItemId) -> Result<()> {
        let _guard = self.guard(ActionKey::DeleteLibraryItem(id))?;

        let removed = self.with_state(|s| {
            let index = s.snapshot.library.iter().position(|i| i.id == id)?;
            Some((index, s.snapshot.library.remove(index)))
        });

        match self.backend.delete_library_item(id).await {
            Ok(()) => {
                info!(item = %id, "Deleted library item");
                self.refresh_after_mutation().await;
                Ok(())
            }
            Err(e) => {
                if let Some((index, item)) = removed {
                    self.with_state(|s| {
                        if s.snapshot.library_item(id).is_none() {
                            let index = index.min(s.snapshot.library.len());
                            s.snapshot.library.insert(index, item);
                        }
                    });
                }
                warn!(item = %id, error = %e, "Library delete failed, item restored");
                Err(e)
            }
        }
    }
}
