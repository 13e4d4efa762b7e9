//! In-memory backend that records every delivery attempt.
//!
//! Used by this crate's tests and, behind the `test-util` feature, by
//! downstream test suites that exercise the dispatch path without a mail
//! server.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use wichtel_core::EmailMessage;

use crate::backend::{MailBackend, MailStatus, ServiceKind};
use crate::MailError;

/// Records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: Mutex<usize>,
    failing_call: Option<usize>,
    failing_recipient: Option<String>,
    delay: Option<Duration>,
}

impl RecordingBackend {
    /// A backend that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th send attempt (1-based).
    #[must_use]
    pub fn failing_call(mut self, n: usize) -> Self {
        self.failing_call = Some(n);
        self
    }

    /// Fail every message addressed to `recipient`.
    #[must_use]
    pub fn failing_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.failing_recipient = Some(recipient.into());
        self
    }

    /// Sleep for `delay` before each send.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages accepted so far.
    #[must_use]
    #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }

    /// Total send attempts, successful or not.
    #[must_use]
    #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempts lock poisoned")
    }
}

#[async_trait]
impl MailBackend for RecordingBackend {
    #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError> {
        let attempt = {
            let mut attempts = self.attempts.lock().expect("attempts lock poisoned");
            *attempts += 1;
            *attempts
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_call == Some(attempt) {
            return Err(MailError::Connection(format!("injected failure on call {attempt}")));
        }
        if let Some(bad) = &self.failing_recipient {
            if message.recipients().iter().any(|r| r == bad) {
                return Err(MailError::Connection(format!("mailbox {bad} unavailable")));
            }
        }
        self.sent.lock().expect("sent lock poisoned").push(message.clone());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn status(&self) -> MailStatus {
        MailStatus {
            service: "Recording".to_owned(),
            kind: ServiceKind::Development,
            available: true,
            endpoint: "memory".to_owned(),
            default_sender: "noreply@localhost".to_owned(),
            requires_auth: false,
            tls: false,
            status_message: format!("{} message(s) recorded", self.sent().len()),
            web_ui: None,
            server_version: None,
        }
    }
}
