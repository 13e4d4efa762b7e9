//! Conversion of [`EmailMessage`] into a wire-ready `lettre` message.

use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::Message;
use wichtel_core::EmailMessage;

use crate::MailError;

/// Parse a sender or recipient address.
///
/// # Errors
/// Returns [`MailError::InvalidAddress`] if `raw` is not a valid mailbox.
pub fn parse_mailbox(raw: &str) -> Result<Mailbox, MailError> {
    raw.trim().parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Assemble a MIME message from `sender` and `message`.
///
/// A message with an HTML body is sent as `multipart/alternative`; otherwise
/// it is plain text.
///
/// # Errors
/// Returns [`MailError::InvalidAddress`] for a bad recipient and
/// [`MailError::Build`] if the message has no recipients or cannot be built.
pub fn build_message(sender: &Mailbox, message: &EmailMessage) -> Result<Message, MailError> {
    if message.recipients().is_empty() {
        return Err(MailError::Build("message has no recipients".to_owned()));
    }

    let mut builder = Message::builder().from(sender.clone()).subject(message.subject());
    for recipient in message.recipients() {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let built = match message.html_body() {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.body().to_owned(),
            html.to_owned(),
        )),
        None => builder.header(ContentType::TEXT_PLAIN).body(message.body().to_owned()),
    };
    built.map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Mailbox {
        match parse_mailbox("noreply@localhost") {
            Ok(m) => m,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn plain_message_carries_subject_and_recipients() {
        let message = EmailMessage::new(
            vec!["alice@example.com".into(), "bob@example.com".into()],
            "Hello",
            "Body text",
        );
        let built = match build_message(&sender(), &message) {
            Ok(m) => m,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(built.envelope().to().len(), 2);
        let raw = String::from_utf8_lossy(&built.formatted()).into_owned();
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("Body text"));
    }

    #[test]
    fn html_message_is_multipart_alternative() {
        let message = EmailMessage::to("alice@example.com", "Hi", "plain").with_html_body("<p>rich</p>");
        let built = match build_message(&sender(), &message) {
            Ok(m) => m,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let raw = String::from_utf8_lossy(&built.formatted()).into_owned();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn bad_recipient_is_invalid_address() {
        let message = EmailMessage::to("not an address", "s", "b");
        assert!(matches!(
            build_message(&sender(), &message),
            Err(MailError::InvalidAddress { ref address, .. }) if address == "not an address"
        ));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let message = EmailMessage::new(Vec::new(), "s", "b");
        assert!(matches!(build_message(&sender(), &message), Err(MailError::Build(_))));
    }
}
