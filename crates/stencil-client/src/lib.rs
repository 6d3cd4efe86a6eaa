//! # stencil-client
//!
//! Client-side orchestration of the Stencil template pipeline.
//!
//! - **Backend** seam ([`backend::TemplateBackend`]) with an HTTP
//!   implementation over the REST API
//! - **Orchestrator** holding the session snapshot of uploads, jobs and
//!   library items, running actions and reconciling after each one
//! - **Notices** turning action outcomes into user-facing messages

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod notice;
pub mod orchestrator;
pub mod state;

#[cfg(test)]
mod fake;

pub use backend::{NewUpload, TemplateBackend};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use notice::{Level, Notice};
pub use orchestrator::{Action, ActionKey, Completed, Orchestrator};
pub use state::{ArtifactSource, Phase, Snapshot};
