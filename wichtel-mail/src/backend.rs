//! Mail backend abstraction trait.
//!
//! Allows swapping between the local capture server and a real SMTP relay
//! without changing the dispatch logic.

use async_trait::async_trait;
use serde::Serialize;
use wichtel_core::EmailMessage;

use crate::MailError;

/// Whether a backend delivers to real inboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Mail is captured locally for inspection.
    Development,
    /// Mail is relayed to real recipients.
    Production,
}

/// Status snapshot of a mail backend, suitable for a diagnostics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct MailStatus {
    /// Human-readable service name.
    pub service: String,
    /// Development or production.
    pub kind: ServiceKind,
    /// Whether the backend can accept mail right now.
    pub available: bool,
    /// `host:port` of the SMTP endpoint.
    pub endpoint: String,
    /// Envelope sender used for outgoing mail.
    pub default_sender: String,
    /// Whether the backend logs in before sending.
    pub requires_auth: bool,
    /// Whether the connection is encrypted.
    pub tls: bool,
    /// One-line summary.
    pub status_message: String,
    /// URL of the web inbox, for capture backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_ui: Option<String>,
    /// Version reported by the capture server, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
}

/// Mail delivery abstraction.
///
/// Implementations must be `Send + Sync` to allow sharing one backend
/// across every event session.
///
/// # Cancel Safety
/// Dropping a `send_email` future may or may not have delivered the
/// message; callers treat a dropped send as a failure.
#[async_trait]
pub trait MailBackend: Send + Sync {
    /// Deliver one message to all of its recipients.
    ///
    /// # Errors
    /// Returns [`MailError::InvalidAddress`] for unparseable addresses and
    /// [`MailError::Connection`] when the server cannot be reached or
    /// rejects the message.
    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError>;

    /// Cheap readiness probe. Never fails; unreachable means `false`.
    async fn is_available(&self) -> bool;

    /// Describe the backend and its current reachability.
    async fn status(&self) -> MailStatus;
}
