//! CRUD and status transitions for [`ConversionJob`] records.
//!
//! Status only moves forward: QUEUED → RUNNING → SUCCESS | ERROR (a queued
//! job may also fail directly). Each transition is a single guarded UPDATE,
//! so a job can never be completed twice or regress.

use chrono::Utc;
use rusqlite::params;
use stencil_shared::{ConversionJob, JobId, JobStatus, Target, UploadId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::row::{enum_at, ts, ts_at, uuid_at};

const JOB_COLUMNS: &str =
    "id, upload_id, upload_title, target, status, log, zip_file, created_at, updated_at";

/// Log line written when a worker picks a job up.
pub const RUNNING_LOG: &str = "Starting template conversion...";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a job. Rejects rows whose artifact and status disagree.
    pub fn insert_job(&self, job: &ConversionJob) -> Result<()> {
        if !job.artifact_consistent() {
            return Err(StoreError::Invariant(format!(
                "job {} has status {} but artifact {:?}",
                job.id, job.status, job.artifact
            )));
        }

        self.conn().execute(
            "INSERT INTO conversion_jobs
                (id, upload_id, upload_title, target, status, log, zip_file, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id.to_string(),
                job.upload_id.to_string(),
                job.upload_title,
                job.target.as_str(),
                job.status.as_str(),
                job.log,
                job.artifact,
                ts(job.created_at),
                ts(job.updated_at),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_job(&self, id: JobId) -> Result<ConversionJob> {
        self.conn()
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM conversion_jobs WHERE id = ?1"),
                params![id.to_string()],
                row_to_job,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all jobs, most recent first.
    pub fn list_jobs(&self) -> Result<Vec<ConversionJob>> {
        self.query_jobs(
            &format!(
                "SELECT {JOB_COLUMNS} FROM conversion_jobs ORDER BY created_at DESC, rowid DESC"
            ),
            params![],
        )
    }

    /// The oldest queued job, if any.
    pub fn next_queued_job(&self) -> Result<Option<ConversionJob>> {
        let mut jobs = self.query_jobs(
            &format!(
                "SELECT {JOB_COLUMNS} FROM conversion_jobs
                 WHERE status = 'QUEUED'
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT 1"
            ),
            params![],
        )?;
        Ok(jobs.pop())
    }

    fn query_jobs(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ConversionJob>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(args, row_to_job)?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// QUEUED → RUNNING. Returns `false` if another worker got there first.
    pub fn claim_job(&self, id: JobId) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE conversion_jobs
             SET status = 'RUNNING', log = ?2, updated_at = ?3
             WHERE id = ?1 AND status = 'QUEUED'",
            params![id.to_string(), RUNNING_LOG, ts(Utc::now())],
        )?;
        Ok(affected > 0)
    }

    /// RUNNING → SUCCESS with the produced artifact.
    pub fn complete_job(&self, id: JobId, artifact: &str, log: &str) -> Result<bool> {
        if artifact.trim().is_empty() {
            return Err(StoreError::Invariant(format!(
                "job {id} cannot succeed without an artifact"
            )));
        }

        let affected = self.conn().execute(
            "UPDATE conversion_jobs
             SET status = 'SUCCESS', zip_file = ?2, log = ?3, updated_at = ?4
             WHERE id = ?1 AND status = 'RUNNING'",
            params![id.to_string(), artifact, log, ts(Utc::now())],
        )?;
        Ok(affected > 0)
    }

    /// QUEUED | RUNNING → ERROR. Clears any artifact.
    pub fn fail_job(&self, id: JobId, log: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE conversion_jobs
             SET status = 'ERROR', zip_file = NULL, log = ?2, updated_at = ?3
             WHERE id = ?1 AND status IN ('QUEUED', 'RUNNING')",
            params![id.to_string(), log, ts(Utc::now())],
        )?;
        Ok(affected > 0)
    }

    /// Put jobs left RUNNING by an interrupted process back in the queue.
    pub fn requeue_running_jobs(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE conversion_jobs
             SET status = 'QUEUED', log = '', updated_at = ?1
             WHERE status = 'RUNNING'",
            params![ts(Utc::now())],
        )?;
        Ok(affected)
    }
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversionJob> {
    Ok(ConversionJob {
        id: JobId(uuid_at(row, 0)?),
        upload_id: UploadId(uuid_at(row, 1)?),
        upload_title: row.get(2)?,
        target: enum_at(row, 3, Target::parse)?,
        status: enum_at(row, 4, JobStatus::parse)?,
        log: row.get(5)?,
        artifact: row.get(6)?,
        created_at: ts_at(row, 7)?,
        updated_at: ts_at(row, 8)?,
    })
}
