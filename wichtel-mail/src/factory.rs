//! Backend selection from [`MailSettings`].

use async_trait::async_trait;
use wichtel_core::EmailMessage;

use crate::backend::{MailBackend, MailStatus};
use crate::capture::CaptureBackend;
use crate::config::{BackendKind, MailSettings};
use crate::smtp::SmtpBackend;
use crate::MailError;

/// Either concrete backend, so callers can hold one type regardless of
/// which was selected at startup.
#[derive(Debug)]
pub enum AnyBackend {
    /// Local capture server.
    Capture(CaptureBackend),
    /// SMTP relay.
    Smtp(SmtpBackend),
}

impl AnyBackend {
    /// Which kind of backend this is.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Capture(_) => BackendKind::Capture,
            Self::Smtp(_) => BackendKind::Smtp,
        }
    }
}

#[async_trait]
impl MailBackend for AnyBackend {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError> {
        match self {
            Self::Capture(b) => b.send_email(message).await,
            Self::Smtp(b) => b.send_email(message).await,
        }
    }

    async fn is_available(&self) -> bool {
        match self {
            Self::Capture(b) => b.is_available().await,
            Self::Smtp(b) => b.is_available().await,
        }
    }

    async fn status(&self) -> MailStatus {
        match self {
            Self::Capture(b) => b.status().await,
            Self::Smtp(b) => b.status().await,
        }
    }
}

/// Resolve the backend kind: an explicit override wins, then development
/// mode selects the capture server, otherwise SMTP.
#[must_use]
pub fn select_kind(settings: &MailSettings) -> BackendKind {
    match settings.force {
        Some(kind) => kind,
        None if settings.development => BackendKind::Capture,
        None => BackendKind::Smtp,
    }
}

/// Construct the backend chosen by [`select_kind`].
///
/// The capture backend is started if its port is closed. A capture server
/// that cannot be started is an error; there is no silent fallback to SMTP.
///
/// # Errors
/// Propagates construction errors of the chosen backend and, for the capture
/// backend, [`MailError::BinaryNotFound`] or [`MailError::StartFailed`].
pub async fn create_backend(settings: &MailSettings) -> Result<AnyBackend, MailError> {
    let kind = select_kind(settings);
    tracing::info!(backend = %kind, development = settings.development, "selecting mail backend");
    match kind {
        BackendKind::Capture => {
            let backend = CaptureBackend::new(settings.capture.clone(), settings.send_timeout)?;
            backend.ensure_running().await?;
            Ok(AnyBackend::Capture(backend))
        }
        BackendKind::Smtp => {
            SmtpBackend::new(settings.smtp.clone(), settings.send_timeout).map(AnyBackend::Smtp)
        }
    }
}
