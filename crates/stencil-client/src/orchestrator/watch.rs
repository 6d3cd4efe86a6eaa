use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use stencil_shared::{ConversionJob, JobId};
use tracing::{debug, info};

use super::Orchestrator;
use crate::error::{ClientError, Result};
use crate::state::{ArtifactSource, Snapshot};

impl Orchestrator {
    /// Refresh, then yield the job's current state, forever. Every item after
    /// the first waits `interval`.
    pub fn job_updates(
        &self,
        id: JobId,
        interval: Duration,
    ) -> impl Stream<Item = Result<ConversionJob>> + '_ {
        stream::unfold(false, move |started| async move {
            if started {
                tokio::time::sleep(interval).await;
            }
            Some((self.poll_job(id).await, true))
        })
    }

    async fn poll_job(&self, id: JobId) -> Result<ConversionJob> {
        self.refresh().await?;
        self.with_state(|s| s.snapshot.job(id).cloned())
            .ok_or_else(|| ClientError::Unknown(format!("Job {id} not found")))
    }

    /// Poll until the job is `SUCCESS` or `ERROR`, or `max_polls` polls have
    /// been made. Returns the last observed state either way.
    pub async fn watch_job(
        &self,
        id: JobId,
        interval: Duration,
        max_polls: u32,
    ) -> Result<ConversionJob> {
        let updates = self
            .job_updates(id, interval)
            .take(max_polls.max(1) as usize);
        futures::pin_mut!(updates);

        let mut last = None;
        while let Some(job) = updates.next().await {
            let job = job?;
            debug!(job = %job.id, status = %job.status, "Polled job");
            if job.is_finished() {
                return Ok(job);
            }
            last = Some(job);
        }

        last.ok_or_else(|| ClientError::Unknown(format!("Job {id} not found")))
    }

    /// Fetch an artifact into `dir` under its derived file name.
    pub async fn download_artifact(&self, source: ArtifactSource, dir: &Path) -> Result<PathBuf> {
        let (reference, file_name) = self.with_state(|s| artifact_of(&s.snapshot, source))?;

        let bytes = self.backend.fetch_artifact(&reference).await?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        info!(path = %path.display(), bytes = bytes.len(), "Saved artifact");
        Ok(path)
    }
}

fn artifact_of(snapshot: &Snapshot, source: ArtifactSource) -> Result<(String, String)> {
    match source {
        ArtifactSource::Job(id) => {
            let job = snapshot
                .job(id)
                .ok_or_else(|| ClientError::Unknown(format!("Job {id} not found")))?;
            let reference = job.artifact.clone().ok_or_else(|| {
                ClientError::Unknown(format!("Job {id} has no archive (status {})", job.status))
            })?;
            Ok((reference, job.artifact_file_name()))
        }
        ArtifactSource::LibraryItem(id) => {
            let item = snapshot
                .library_item(id)
                .ok_or_else(|| ClientError::Unknown(format!("Library item {id} not found")))?;
            Ok((item.artifact.clone(), item.artifact_file_name()))
        }
    }
}
