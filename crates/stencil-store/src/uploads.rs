//! CRUD operations for [`Upload`] records.

use rusqlite::params;
use stencil_shared::{Upload, UploadId, UploadStatus};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::row::{enum_at, ts, ts_at, uuid_at};

const UPLOAD_COLUMNS: &str = "id, title, image, status, notes, created_at";

impl Database {
    /// Insert a new upload.
    pub fn insert_upload(&self, upload: &Upload) -> Result<()> {
        self.conn().execute(
            "INSERT INTO uploads (id, title, image, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                upload.id.to_string(),
                upload.title,
                upload.image,
                upload.status.as_str(),
                upload.notes,
                ts(upload.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_upload(&self, id: UploadId) -> Result<Upload> {
        self.conn()
            .query_row(
                &format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = ?1"),
                params![id.to_string()],
                row_to_upload,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all uploads, most recent first.
    pub fn list_uploads(&self) -> Result<Vec<Upload>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], row_to_upload)?;

        let mut uploads = Vec::new();
        for row in rows {
            uploads.push(row?);
        }
        Ok(uploads)
    }

    /// Uploads still awaiting readiness processing, oldest first.
    pub fn list_pending_uploads(&self) -> Result<Vec<Upload>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads
             WHERE status = 'PENDING'
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map([], row_to_upload)?;

        let mut uploads = Vec::new();
        for row in rows {
            uploads.push(row?);
        }
        Ok(uploads)
    }

    /// Settle a pending upload to `Ready` or `Failed`.
    ///
    /// Returns `false` if the upload no longer exists or was already settled.
    pub fn settle_upload(&self, id: UploadId, status: UploadStatus) -> Result<bool> {
        if !status.is_terminal() {
            return Err(StoreError::Invariant(format!(
                "upload {id} cannot be settled to {status}"
            )));
        }

        let affected = self.conn().execute(
            "UPDATE uploads SET status = ?2 WHERE id = ?1 AND status = 'PENDING'",
            params![id.to_string(), status.as_str()],
        )?;
        Ok(affected > 0)
    }

    // only removes the row; jobs that reference it are left in place
    pub fn delete_upload(&self, id: UploadId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM uploads WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_upload(row: &rusqlite::Row<'_>) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: UploadId(uuid_at(row, 0)?),
        title: row.get(1)?,
        image: row.get(2)?,
        status: enum_at(row, 3, UploadStatus::parse)?,
        notes: row.get(4)?,
        created_at: ts_at(row, 5)?,
    })
}
