//! Session state owned by the [`Orchestrator`](crate::orchestrator::Orchestrator).
//!
//! The collections here are cached copies of what the backend last returned.
//! The backend stays authoritative; the snapshot is replaced wholesale on
//! every successful refresh.

use std::collections::HashSet;

use stencil_shared::{
    ConversionJob, JobId, LibraryItem, LibraryItemId, Target, Upload, UploadId,
};
use uuid::Uuid;

use crate::orchestrator::ActionKey;

/// Lifecycle of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// First load has not completed yet.
    Initializing,
    /// A snapshot is loaded and no reload is running.
    Ready,
    /// A reload is running; the previous snapshot is still served.
    Refreshing,
    /// The first load failed. Collections are empty until a refresh succeeds.
    Failed(String),
}

/// Something that owns a downloadable archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    Job(JobId),
    LibraryItem(LibraryItemId),
}

/// The three collections as last fetched, each in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub uploads: Vec<Upload>,
    pub jobs: Vec<ConversionJob>,
    pub library: Vec<LibraryItem>,
}

impl Snapshot {
    pub fn upload(&self, id: UploadId) -> Option<&Upload> {
        self.uploads.iter().find(|u| u.id == id)
    }

    pub fn job(&self, id: JobId) -> Option<&ConversionJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn library_item(&self, id: LibraryItemId) -> Option<&LibraryItem> {
        self.library.iter().find(|i| i.id == id)
    }

    /// Jobs for `upload`. Returns an empty list for an upload that no longer
    /// exists, even if jobs still reference it.
    pub fn jobs_for_upload(&self, upload: UploadId) -> Vec<&ConversionJob> {
        if self.upload(upload).is_none() {
            return Vec::new();
        }
        self.jobs.iter().filter(|j| j.upload_id == upload).collect()
    }

    /// Jobs whose upload has been deleted.
    pub fn orphaned_jobs(&self) -> Vec<&ConversionJob> {
        self.jobs
            .iter()
            .filter(|j| self.upload(j.upload_id).is_none())
            .collect()
    }

    /// Uploads a conversion can be requested for.
    pub fn convertible_uploads(&self) -> Vec<&Upload> {
        self.uploads.iter().filter(|u| u.is_convertible()).collect()
    }

    pub fn library_by_target(&self, target: Target) -> Vec<&LibraryItem> {
        self.library.iter().filter(|i| i.target == target).collect()
    }

    /// Resolve a bare id to whichever job or library item carries it.
    pub fn locate_artifact(&self, id: Uuid) -> Option<ArtifactSource> {
        if self.job(JobId(id)).is_some() {
            Some(ArtifactSource::Job(JobId(id)))
        } else if self.library_item(LibraryItemId(id)).is_some() {
            Some(ArtifactSource::LibraryItem(LibraryItemId(id)))
        } else {
            None
        }
    }
}

pub(crate) struct SessionState {
    pub phase: Phase,
    pub snapshot: Snapshot,
    /// Keys of mutating actions currently running.
    pub in_flight: HashSet<ActionKey>,
    /// Sequence number handed to the most recently started load.
    pub load_started: u64,
    /// Sequence number of the load whose result is in `snapshot`.
    pub load_applied: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            snapshot: Snapshot::default(),
            in_flight: HashSet::new(),
            load_started: 0,
            load_applied: 0,
        }
    }
}
