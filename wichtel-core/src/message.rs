use serde::{Deserialize, Serialize};

/// An outgoing email, immutable once built.
///
/// Backends decide the envelope sender; the message only carries content and
/// recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    recipients: Vec<String>,
    subject: String,
    body: String,
    html_body: Option<String>,
}

impl EmailMessage {
    /// Build a plain-text message for one or more recipients.
    #[must_use]
    pub fn new(recipients: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { recipients, subject: subject.into(), body: body.into(), html_body: None }
    }

    /// Build a plain-text message for a single recipient.
    #[must_use]
    pub fn to(recipient: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(vec![recipient.into()], subject, body)
    }

    /// Attach an HTML alternative to the plain-text body.
    #[must_use]
    pub fn with_html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Recipient addresses.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Plain-text body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Optional HTML alternative.
    #[must_use]
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }
}
