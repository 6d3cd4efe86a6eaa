//! User-facing messages produced by [`Orchestrator::dispatch`](crate::orchestrator::Orchestrator::dispatch).

use std::fmt;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    /// `"<headline>: <detail>"` for a failed action.
    pub fn failure(headline: &str, err: &ClientError) -> Self {
        Self::error(format!("{headline}: {}", describe_error(err)))
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The part of an error worth showing to a user.
pub fn describe_error(err: &ClientError) -> String {
    match err {
        ClientError::Transport(_) => {
            "Could not reach the server. Please check your connection.".to_string()
        }
        ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
        ClientError::Remote { message, .. } | ClientError::NotFound { message } => {
            message.clone()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_shared::ValidationError;

    #[test]
    fn test_failure_messages() {
        let remote = ClientError::Remote {
            status: 400,
            message: "Job must be successful and have a zip file".into(),
        };
        assert_eq!(
            Notice::failure("Could not add to library", &remote).message,
            "Could not add to library: Job must be successful and have a zip file"
        );

        let invalid = ClientError::Validation(ValidationError::EmptyName);
        let notice = Notice::failure("Could not add to library", &invalid);
        assert!(notice.is_error());
        assert_eq!(
            notice.to_string(),
            "Could not add to library: Library name must not be empty"
        );
    }

    #[test]
    fn test_malformed_payload_is_not_a_connection_problem() {
        let err = ClientError::from(serde_json::from_str::<Vec<u32>>("[\"x\"]").unwrap_err());
        assert_eq!(
            Notice::failure("Failed to load data", &err).message,
            "Failed to load data: The server sent an unexpected response."
        );
    }
}
