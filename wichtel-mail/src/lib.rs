//! Mail delivery and event sessions for the Wichtel gift-exchange organizer.
//!
//! A [`MailBackend`] delivers [`wichtel_core::EmailMessage`]s, either to a
//! local capture server during development or to a real SMTP relay. The
//! [`BatchSender`] renders and dispatches assignment notifications, and an
//! [`EventSession`] drives one event from registration to confirmed dispatch.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod capture;
mod capture_api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod sender;
pub mod session;
pub mod smtp;
pub mod templates;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backend::{MailBackend, MailStatus, ServiceKind};
pub use capture::CaptureBackend;
pub use capture_api::CaptureInfo;
pub use config::{BackendKind, CaptureConfig, MailSettings, SmtpConfig, DEFAULT_SEND_TIMEOUT};
pub use error::{MailError, SessionError};
pub use factory::{create_backend, select_kind, AnyBackend};
pub use sender::{BatchSender, DeliveryFailure, DispatchReport};
pub use session::EventSession;
pub use smtp::SmtpBackend;
