//! In-memory [`TemplateBackend`] that answers the way the REST backend does.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use stencil_shared::{
    timestamp_now, ConversionJob, JobId, JobStatus, LibraryItem, LibraryItemId, Target, Upload,
    UploadId, UploadStatus,
};
use tokio::sync::Notify;

use crate::backend::{NewUpload, TemplateBackend};
use crate::error::{ClientError, Result};

pub const ARCHIVE: &[u8] = b"PK\x05\x06fake archive";

#[derive(Default)]
struct Inner {
    uploads: Vec<Upload>,
    jobs: Vec<ConversionJob>,
    library: Vec<LibraryItem>,
    artifacts: HashMap<String, Vec<u8>>,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, (u16, String)>,
    gate_create_job: bool,
    auto_advance: bool,
}

#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
    gate: Notify,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Record the call, then answer with the injected failure if any.
    fn enter(&self, op: &'static str) -> Result<()> {
        let mut inner = self.inner();
        inner.calls.push(op);
        match inner.failures.get(op) {
            Some((404, message)) => Err(ClientError::NotFound {
                message: message.clone(),
            }),
            Some((status, message)) => Err(ClientError::Remote {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn fail(&self, op: &'static str, status: u16, message: &str) {
        self.inner().failures.insert(op, (status, message.to_string()));
    }

    pub fn recover(&self, op: &'static str) {
        self.inner().failures.remove(op);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.inner().calls.iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.inner().calls.len()
    }

    /// Hold `create_job` until [`FakeBackend::open_gate`] is called.
    pub fn close_gate(&self) {
        self.inner().gate_create_job = true;
    }

    pub fn open_gate(&self) {
        self.inner().gate_create_job = false;
        self.gate.notify_one();
    }

    /// Move pending uploads to READY and jobs one step forward on every list.
    pub fn auto_advance(&self) {
        self.inner().auto_advance = true;
    }

    pub fn seed_upload(&self, title: &str, status: UploadStatus) -> Upload {
        let id = UploadId::new();
        let upload = Upload {
            id,
            created_at: timestamp_now(),
            title: title.to_string(),
            image: format!("/media/uploads/{id}.png"),
            status,
            notes: String::new(),
        };
        self.inner().uploads.insert(0, upload.clone());
        upload
    }

    pub fn seed_job(&self, upload: &Upload, target: Target, status: JobStatus) -> ConversionJob {
        let now = timestamp_now();
        let mut job = ConversionJob {
            id: JobId::new(),
            upload_id: upload.id,
            upload_title: upload.title.clone(),
            target,
            status: JobStatus::Queued,
            log: String::new(),
            artifact: None,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner();
        settle(&mut inner, &mut job, status);
        inner.jobs.insert(0, job.clone());
        job
    }

    pub fn set_upload_status(&self, id: UploadId, status: UploadStatus) {
        if let Some(upload) = self.inner().uploads.iter_mut().find(|u| u.id == id) {
            upload.status = status;
        }
    }

    pub fn finish_job(&self, id: JobId, status: JobStatus) {
        let mut inner = self.inner();
        if let Some(index) = inner.jobs.iter().position(|j| j.id == id) {
            let mut job = inner.jobs[index].clone();
            settle(&mut inner, &mut job, status);
            inner.jobs[index] = job;
        }
    }

    pub fn job(&self, id: JobId) -> Option<ConversionJob> {
        self.inner().jobs.iter().find(|j| j.id == id).cloned()
    }

    pub fn library_len(&self) -> usize {
        self.inner().library.len()
    }
}

fn settle(inner: &mut Inner, job: &mut ConversionJob, status: JobStatus) {
    job.status = status;
    job.updated_at = timestamp_now();
    match status {
        JobStatus::Success => {
            let reference = format!("/media/builds/{}.zip", job.id);
            inner.artifacts.insert(reference.clone(), ARCHIVE.to_vec());
            job.artifact = Some(reference);
            job.log = "Conversion completed successfully!".into();
        }
        JobStatus::Error => {
            job.artifact = None;
            job.log = "CONVERSION ERROR: Could not convert the design.\n\nTechnical Details:\nboom".into();
        }
        _ => job.artifact = None,
    }
}

#[async_trait]
impl TemplateBackend for FakeBackend {
    async fn list_uploads(&self) -> Result<Vec<Upload>> {
        self.enter("list_uploads")?;
        let mut inner = self.inner();
        if inner.auto_advance {
            for upload in inner.uploads.iter_mut() {
                if upload.status == UploadStatus::Pending {
                    upload.status = UploadStatus::Ready;
                }
            }
        }
        Ok(inner.uploads.clone())
    }

    async fn create_upload(&self, upload: NewUpload) -> Result<Upload> {
        self.enter("create_upload")?;
        let id = UploadId::new();
        let created = Upload {
            id,
            created_at: timestamp_now(),
            title: upload.title().to_string(),
            image: format!("/media/uploads/{id}.{}", upload.kind().extension()),
            status: UploadStatus::Pending,
            notes: upload.notes().to_string(),
        };
        self.inner().uploads.insert(0, created.clone());
        Ok(created)
    }

    async fn delete_upload(&self, id: UploadId) -> Result<()> {
        self.enter("delete_upload")?;
        let mut inner = self.inner();
        let before = inner.uploads.len();
        inner.uploads.retain(|u| u.id != id);
        if inner.uploads.len() == before {
            return Err(ClientError::NotFound {
                message: "Upload not found.".into(),
            });
        }
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<ConversionJob>> {
        self.enter("list_jobs")?;
        let mut guard = self.inner();
        let inner = &mut *guard;
        if inner.auto_advance {
            let mut jobs = std::mem::take(&mut inner.jobs);
            for job in jobs.iter_mut() {
                match job.status {
                    JobStatus::Queued => settle(inner, job, JobStatus::Running),
                    JobStatus::Running => settle(inner, job, JobStatus::Success),
                    _ => {}
                }
            }
            inner.jobs = jobs;
        }
        Ok(inner.jobs.clone())
    }

    async fn create_job(&self, upload: UploadId, target: Target) -> Result<ConversionJob> {
        self.enter("create_job")?;
        let gated = self.inner().gate_create_job;
        if gated {
            self.gate.notified().await;
        }

        let mut inner = self.inner();
        let source = inner
            .uploads
            .iter()
            .find(|u| u.id == upload)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                message: "Upload not found.".into(),
            })?;
        if source.status != UploadStatus::Ready {
            return Err(ClientError::Remote {
                status: 400,
                message: format!(
                    "Upload {upload} is {}; only READY uploads can be converted",
                    source.status
                ),
            });
        }

        let now = timestamp_now();
        let job = ConversionJob {
            id: JobId::new(),
            upload_id: upload,
            upload_title: source.title,
            target,
            status: JobStatus::Queued,
            log: String::new(),
            artifact: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(0, job.clone());
        Ok(job)
    }

    async fn list_library(&self) -> Result<Vec<LibraryItem>> {
        self.enter("list_library")?;
        Ok(self.inner().library.clone())
    }

    async fn add_to_library(&self, job: JobId, name: &str) -> Result<LibraryItem> {
        self.enter("add_to_library")?;
        let mut inner = self.inner();
        let source = inner
            .jobs
            .iter()
            .find(|j| j.id == job)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                message: "Job not found.".into(),
            })?;
        let artifact = match (&source.status, &source.artifact) {
            (JobStatus::Success, Some(artifact)) => artifact.clone(),
            _ => {
                return Err(ClientError::Remote {
                    status: 400,
                    message: "Job must be successful and have a zip file".into(),
                })
            }
        };

        let id = LibraryItemId::new();
        let reference = format!("/media/library/{id}.zip");
        let bytes = inner.artifacts.get(&artifact).cloned().unwrap_or_default();
        inner.artifacts.insert(reference.clone(), bytes);

        let item = LibraryItem {
            id,
            name: name.to_string(),
            target: source.target,
            artifact: reference,
            created_at: timestamp_now(),
        };
        inner.library.insert(0, item.clone());
        Ok(item)
    }

    async fn delete_library_item(&self, id: LibraryItemId) -> Result<()> {
        self.enter("delete_library_item")?;
        let mut inner = self.inner();
        let before = inner.library.len();
        inner.library.retain(|i| i.id != id);
        if inner.library.len() == before {
            return Err(ClientError::NotFound {
                message: "Library item not found.".into(),
            });
        }
        Ok(())
    }

    async fn fetch_artifact(&self, reference: &str) -> Result<Vec<u8>> {
        self.enter("fetch_artifact")?;
        self.inner()
            .artifacts
            .get(reference)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                message: "Not Found".into(),
            })
    }
}
