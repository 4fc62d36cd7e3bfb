//! Error taxonomy for evidence collection and report generation.
//!
//! Errors are classified by where they surface:
//! - Validation: inline near the offending field, never fatal
//! - Auth: dismissible message, connection flag reset by the caller
//! - Network/Upstream/Parse/Generation: one user-visible message each

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed user input (empty credential, bad date string).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad tracker credentials or a failed identity check.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level HTTP failure (DNS, connect, timeout, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with a non-success status.
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Unreadable or malformed uploaded file.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Report synthesis failure (remote generator or admission gate).
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an Upstream error from a response the remote rejected.
    pub fn upstream(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Error::Upstream {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// Returns true if this error should reset a tracker connection flag.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// The single user-visible message the UI layer shows for this error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Auth(_) => {
                "Connection failed. Check your credentials and try again.".to_string()
            }
            Error::Network(_) => "Network request failed. Check your connection.".to_string(),
            Error::Upstream { status, .. } => {
                format!("The remote service returned an error (HTTP {}).", status)
            }
            Error::Parse(msg) => format!("Could not read the uploaded file: {}", msg),
            Error::Generation(msg) => msg.clone(),
            Error::Io(_) => "A local file operation failed.".to_string(),
            Error::Json(_) => "Received data in an unexpected format.".to_string(),
        }
    }
}
