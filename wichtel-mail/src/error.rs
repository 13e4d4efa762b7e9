//! Error types for the mail crate.

use std::path::PathBuf;
use std::time::Duration;

use wichtel_core::CoreError;

/// Errors that can occur while configuring or talking to a mail backend.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MailError {
    /// Required settings are missing or malformed.
    #[error("mail configuration error: {0}")]
    Configuration(String),

    /// The server could not be reached or rejected the session (network,
    /// TLS, or authentication failure).
    #[error("mail connection error: {0}")]
    Connection(String),

    /// A sender or recipient address could not be parsed.
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The MIME message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(String),

    /// The backend did not finish within the configured bound.
    #[error("mail delivery timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The capture server binary is missing.
    #[error("capture server binary not found at {path}")]
    BinaryNotFound { path: PathBuf },

    /// The capture server was launched but never opened its SMTP port.
    #[error("capture server failed to start: {0}")]
    StartFailed(String),

    /// The capture server's web API returned an error.
    #[error("capture API request failed: {0}")]
    ApiError(String),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`crate::EventSession`] operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// A domain rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A mail backend call failed.
    #[error(transparent)]
    Mail(#[from] MailError),
}
