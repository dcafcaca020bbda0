use std::path::PathBuf;

use thiserror::Error;

use crate::models::Status;

/// Errors a command can fail with. Each maps to its own process exit code.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task '{title}' cannot move from '{from}' to '{to}'")]
    InvalidTransition { title: String, from: Status, to: Status },

    #[error("Task file {path} could not be used: {message}. Fix or move the file and try again.")]
    Store { path: PathBuf, message: String },
}

impl TodoError {
    pub fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        TodoError::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            TodoError::Validation(_) => 2,
            TodoError::NotFound(_) => 3,
            TodoError::InvalidTransition { .. } => 4,
            TodoError::Store { .. } => 5,
        }
    }
}

/// Failures of the external ranking service. Always recovered by falling back to local ranking.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("no API key configured")]
    Disabled,

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Http(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unusable response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AdvisorError::Timeout
        } else if e.is_decode() {
            AdvisorError::Malformed(e.to_string())
        } else {
            AdvisorError::Http(e.to_string())
        }
    }
}
