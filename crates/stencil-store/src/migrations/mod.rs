//! Schema migrations, applied in order by [`Database::open_at`].
//!
//! `PRAGMA user_version` records the last applied step, so each step runs
//! once per database file.
//!
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// `(version, name, step)`, strictly increasing by version.
const STEPS: &[(u32, &str, Step)] = &[(1, "v001_initial", v001_initial::up)];

/// Version of the newest step.
pub const CURRENT_VERSION: u32 = STEPS[STEPS.len() - 1].0;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{applied} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    for (version, name, step) in STEPS.iter().filter(|(v, _, _)| *v > applied) {
        tracing::info!(version, name, "Applying schema migration");
        step(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
