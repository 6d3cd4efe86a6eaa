use stencil_shared::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A precondition failed before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The backend answered 404 for a referenced id.
    #[error("{message}")]
    NotFound { message: String },

    /// The same action is already running for this entity.
    #[error("{0} is already in progress")]
    InFlight(String),

    #[error("Could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body is not the expected JSON.
    #[error("Unexpected response from the backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The referenced entity is not in the current snapshot.
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
