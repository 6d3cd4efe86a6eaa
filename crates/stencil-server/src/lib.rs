//! # stencil-server
//!
//! Reference backend for the Stencil template pipeline.
//!
//! - **REST API** (axum) under `/api/templates` for uploads, conversion jobs
//!   and the template library, plus `/media/...` file serving
//! - **Media store** on disk for screenshots, job archives and library copies
//! - **Worker** that settles uploads to READY/FAILED and runs queued
//!   conversions through a pluggable [`convert::Converter`]
//! - **SQLite persistence** through `stencil-store`

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod media_store;
pub mod worker;

use std::sync::{Arc, Mutex};

use stencil_store::Database;
use tracing::info;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::convert::Converter;
use crate::error::ServerError;
use crate::media_store::MediaStore;
use crate::worker::Worker;

/// The database shared between request handlers and the worker.
///
/// Access goes through [`SharedDb::with`], which keeps the lock scoped to a
/// synchronous closure so it can never be held across an `.await`.
#[derive(Clone)]
pub struct SharedDb(Arc<Mutex<Database>>);

impl SharedDb {
    pub fn new(db: Database) -> Self {
        Self(Arc::new(Mutex::new(db)))
    }

    pub fn with<T>(
        &self,
        f: impl FnOnce(&Database) -> stencil_store::Result<T>,
    ) -> Result<T, ServerError> {
        let db = self
            .0
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))?;
        Ok(f(&db)?)
    }
}

/// Open storage, recover interrupted jobs and build the worker.
///
/// The caller spawns the returned [`Worker`] and serves the [`AppState`].
pub async fn bootstrap(
    config: ServerConfig,
    converter: Arc<dyn Converter>,
) -> Result<(AppState, Worker), ServerError> {
    let db = Database::open_at(&config.database_path)?;

    let requeued = db.requeue_running_jobs()?;
    if requeued > 0 {
        info!(count = requeued, "Requeued jobs interrupted by a previous shutdown");
    }

    let media = Arc::new(MediaStore::new(config.media_root.clone()).await?);
    let db = SharedDb::new(db);
    let (worker, handle) = Worker::new(db.clone(), media.clone(), converter, config.worker_sweep);

    let state = AppState {
        db,
        media,
        worker: handle,
        config: Arc::new(config),
    };
    Ok((state, worker))
}
