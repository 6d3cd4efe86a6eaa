use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Creating the directory that holds the database file failed.
    #[error("Could not prepare database location: {0}")]
    Io(#[from] std::io::Error),

    /// No upload, job or library item with the requested id.
    #[error("Record not found")]
    NotFound,

    /// The write would store a job whose artifact and status disagree, or
    /// similar.
    #[error("Refusing inconsistent write: {0}")]
    Invariant(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
