//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use stencil_shared::constants::{DEFAULT_HTTP_PORT, MAX_UPLOAD_SIZE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./stencil.db`
    pub database_path: PathBuf,

    /// Directory under which uploads, builds and library archives are stored.
    /// Env: `MEDIA_ROOT`
    /// Default: `./media`
    pub media_root: PathBuf,

    /// Maximum accepted screenshot size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 10 MiB
    pub max_upload_size: usize,

    /// How often the worker sweeps for queued work when nothing woke it.
    /// Env: `WORKER_SWEEP_SECS`
    /// Default: `5`
    pub worker_sweep: Duration,

    /// Allow cross-origin requests from any origin.
    /// Env: `CORS_ALLOW_ANY` (true/false)
    /// Default: `true`
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./stencil.db"),
            media_root: PathBuf::from("./media"),
            max_upload_size: MAX_UPLOAD_SIZE,
            worker_sweep: Duration::from_secs(5),
            cors_allow_any: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("MEDIA_ROOT") {
            config.media_root = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("WORKER_SWEEP_SECS") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.worker_sweep = Duration::from_secs(n),
                _ => tracing::warn!(value = %val, "Invalid WORKER_SWEEP_SECS, using default"),
            }
        }

        if let Some(val) = lookup("CORS_ALLOW_ANY") {
            config.cors_allow_any = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
