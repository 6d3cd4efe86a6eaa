//! # stencil-store
//!
//! SQLite persistence for the reference backend: uploads, conversion jobs
//! and library items.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection`, with typed CRUD helpers split per entity.  Job
//! status changes go through guarded transition helpers so the stored rows
//! always satisfy "artifact present iff SUCCESS".

pub mod database;
pub mod jobs;
pub mod library;
pub mod migrations;
pub mod uploads;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
