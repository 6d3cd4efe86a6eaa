//! Background processing: upload readiness and queued conversions.
//!
//! A single worker task drains pending uploads and queued jobs, then sleeps
//! until it is woken through [`WorkerHandle::wake`] or the sweep interval
//! elapses.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use stencil_shared::validation::sniff_image;
use stencil_shared::{ConversionJob, UploadStatus};
use stencil_store::StoreError;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::convert::{pack_zip, success_log, ConversionInput, ConvertError, Converter};
use crate::error::ServerError;
use crate::media_store::{MediaKind, MediaStore};
use crate::SharedDb;

/// Cloneable handle used by request handlers to wake the worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    notify: Arc<Notify>,
}

impl WorkerHandle {
    pub fn wake(&self) {
        self.notify.notify_one();
    }
}

pub struct Worker {
    db: SharedDb,
    media: Arc<MediaStore>,
    converter: Arc<dyn Converter>,
    notify: Arc<Notify>,
    sweep: Duration,
}

impl Worker {
    pub fn new(
        db: SharedDb,
        media: Arc<MediaStore>,
        converter: Arc<dyn Converter>,
        sweep: Duration,
    ) -> (Self, WorkerHandle) {
        let notify = Arc::new(Notify::new());
        let handle = WorkerHandle {
            notify: notify.clone(),
        };
        let worker = Self {
            db,
            media,
            converter,
            notify,
            sweep,
        };
        (worker, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        info!(sweep_secs = self.sweep.as_secs(), "Conversion worker started");
        loop {
            match self.drain().await {
                Ok(0) => {}
                Ok(n) => debug!(processed = n, "Worker pass finished"),
                Err(e) => error!(error = %e, "Worker pass failed"),
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(self.sweep) => {}
            }
        }
    }

    /// Process everything currently pending. Returns the number of uploads
    /// and jobs handled.
    pub async fn drain(&self) -> Result<usize, ServerError> {
        let mut processed = self.settle_pending_uploads().await?;
        while self.run_next_job().await? {
            processed += 1;
        }
        Ok(processed)
    }

    async fn settle_pending_uploads(&self) -> Result<usize, ServerError> {
        let pending = self.db.with(|db| db.list_pending_uploads())?;

        for upload in &pending {
            let status = match self.media.read(&upload.image).await {
                Ok(bytes) => readiness(&bytes),
                Err(e) => {
                    warn!(upload = %upload.id, error = %e, "Upload image unreadable");
                    UploadStatus::Failed
                }
            };

            if self.db.with(|db| db.settle_upload(upload.id, status))? {
                info!(upload = %upload.id, status = %status, "Upload settled");
            }
        }

        Ok(pending.len())
    }

    /// Run the oldest queued job. Returns `false` when the queue is empty.
    async fn run_next_job(&self) -> Result<bool, ServerError> {
        let Some(job) = self.db.with(|db| db.next_queued_job())? else {
            return Ok(false);
        };
        if !self.db.with(|db| db.claim_job(job.id))? {
            return Ok(true);
        }

        info!(job = %job.id, upload = %job.upload_id, target = %job.target, "Conversion started");

        match self.convert(&job).await {
            Ok((artifact, log)) => self.record_success(&job, artifact, &log).await?,
            Err(err) => {
                warn!(job = %job.id, error = %err, "Conversion failed");
                self.db.with(|db| db.fail_job(job.id, &err.failure_log()))?;
            }
        }

        Ok(true)
    }

    /// Mark the job SUCCESS. If that cannot be recorded the stored archive
    /// is removed and the job, when still RUNNING, is failed instead.
    async fn record_success(
        &self,
        job: &ConversionJob,
        artifact: String,
        log: &str,
    ) -> Result<(), ServerError> {
        let outcome = self.db.with(|db| db.complete_job(job.id, &artifact, log));
        if matches!(outcome, Ok(true)) {
            info!(job = %job.id, artifact = %artifact, "Conversion succeeded");
            return Ok(());
        }

        if let Err(e) = self.media.remove(&artifact).await {
            warn!(
                job = %job.id,
                artifact = %artifact,
                error = %e,
                "Could not remove unused archive"
            );
        }

        match outcome {
            Err(e) => {
                error!(job = %job.id, error = %e, "Could not record conversion result");
                let failure = ConvertError::Failed(format!("could not record result: {e}"));
                self.db.with(|db| db.fail_job(job.id, &failure.failure_log()))?;
            }
            Ok(_) => warn!(job = %job.id, "Job no longer RUNNING; archive discarded"),
        }
        Ok(())
    }

    async fn convert(&self, job: &ConversionJob) -> Result<(String, String), ConvertError> {
        let upload = match self.db.with(|db| db.get_upload(job.upload_id)) {
            Ok(upload) => upload,
            Err(ServerError::Store(StoreError::NotFound)) => {
                return Err(ConvertError::MissingImage(format!(
                    "upload {} was deleted",
                    job.upload_id
                )));
            }
            Err(e) => return Err(ConvertError::Failed(e.to_string())),
        };

        let image = self.media.read(&upload.image).await.map_err(|e| match e {
            ServerError::MediaNotFound(reference) => ConvertError::MissingImage(reference),
            other => ConvertError::Failed(other.to_string()),
        })?;

        let input = ConversionInput {
            title: job.upload_title.clone(),
            target: job.target,
            image,
        };
        let converter = Arc::clone(&self.converter);
        let (archive, file_count) = tokio::task::spawn_blocking(move || {
            let files = converter.convert(&input)?;
            let archive = pack_zip(&files)?;
            Ok::<_, ConvertError>((archive, files.len()))
        })
        .await
        .map_err(|e| ConvertError::Failed(format!("conversion task aborted: {e}")))??;

        let file_name = format!("{}.zip", Uuid::new_v4());
        let artifact = self
            .media
            .store(MediaKind::Build, &file_name, &archive)
            .await
            .map_err(|e| ConvertError::Archive(e.to_string()))?;

        Ok((artifact, success_log(job.target, file_count)))
    }
}

/// READY when the bytes are a supported image with non-zero dimensions.
pub fn readiness(bytes: &[u8]) -> UploadStatus {
    if sniff_image(bytes).is_err() {
        return UploadStatus::Failed;
    }

    let dimensions = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    match dimensions {
        Some((w, h)) if w > 0 && h > 0 => UploadStatus::Ready,
        _ => UploadStatus::Failed,
    }
}
