//! v001 -- Initial schema creation.
//!
//! Creates `uploads`, `conversion_jobs` and `library_items`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Uploads
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS uploads (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title      TEXT NOT NULL,
    image      TEXT NOT NULL,               -- media reference
    status     TEXT NOT NULL DEFAULT 'PENDING',
    notes      TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL                -- RFC-3339, microseconds, UTC
);

CREATE INDEX IF NOT EXISTS idx_uploads_status ON uploads(status);

-- ----------------------------------------------------------------
-- Conversion jobs
--
-- upload_id is deliberately not a foreign key: deleting an upload
-- leaves its jobs in place (orphaned).
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversion_jobs (
    id           TEXT PRIMARY KEY NOT NULL,
    upload_id    TEXT NOT NULL,
    upload_title TEXT NOT NULL,
    target       TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'QUEUED',
    log          TEXT NOT NULL DEFAULT '',
    zip_file     TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,

    CHECK ((status = 'SUCCESS') = (zip_file IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_jobs_status_created
    ON conversion_jobs(status, created_at);
CREATE INDEX IF NOT EXISTS idx_jobs_upload ON conversion_jobs(upload_id);

-- ----------------------------------------------------------------
-- Library items
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS library_items (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    target     TEXT NOT NULL,
    zip_file   TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
