//! Message bodies for every email the organizer sends.

use chrono::{DateTime, Local};
use wichtel_core::{EmailMessage, Participant};

use crate::backend::{MailStatus, ServiceKind};

/// Ask the organizer to confirm a pending batch.
#[must_use]
pub fn confirmation_request(creator: &Participant, confirm_url: &str) -> EmailMessage {
    let body = format!(
        "Hello,\n\n\
         Please click the following link to confirm and send out the Secret Santa assignments: {confirm_url}\n\n\
         This link will expire after one use or if the game is reset."
    );
    let html = format!(
        "<p>Hello,</p>\
         <p>Please click the following link to confirm and send out the Secret Santa assignments: \
         <a href=\"{url}\">{url}</a></p>\
         <p>This link will expire after one use or if the game is reset.</p>",
        url = escape_html(confirm_url),
    );
    EmailMessage::to(&creator.email, "Confirm Secret Santa Assignments", body).with_html_body(html)
}

/// Tell a giver who they are buying for. Names only that giver's receiver.
#[must_use]
pub fn assignment_notice(giver: &Participant, receiver: &Participant) -> EmailMessage {
    EmailMessage::to(
        &giver.email,
        "Your Secret Santa Assignment!",
        format!("Hello {},\n\nYou are the Secret Santa for: {}!", giver.name, receiver.name),
    )
}

/// Tell the organizer which givers were notified. Never lists pairings.
#[must_use]
pub fn creator_summary(creator: &Participant, notified: &[&str], failed: &[&str]) -> EmailMessage {
    let mut body = format!(
        "Hello {},\n\nThe Secret Santa assignments have been sent out.\n\nNotified ({}):\n",
        creator.name,
        notified.len()
    );
    for name in notified {
        body.push_str("- ");
        body.push_str(name);
        body.push('\n');
    }
    if !failed.is_empty() {
        body.push_str(&format!("\nCould not be reached ({}):\n", failed.len()));
        for name in failed {
            body.push_str("- ");
            body.push_str(name);
            body.push('\n');
        }
    }
    body.push_str("\nThe pairings stay secret, even from you. Happy gifting!");
    EmailMessage::to(&creator.email, "Secret Santa Assignments Sent", body)
}

/// Diagnostic message describing the active backend.
#[must_use]
pub fn test_message(recipient: &str, status: &MailStatus, now: DateTime<Local>) -> EmailMessage {
    let kind = match status.kind {
        ServiceKind::Development => "development",
        ServiceKind::Production => "production",
    };
    let mut body = format!(
        "Hello from your Wichteln application!\n\n\
         This is a test email to verify that email integration is working correctly.\n\n\
         Configuration:\n\
         - Mail Service: {} ({kind})\n\
         - Status: {}\n\
         - Timestamp: {}\n",
        status.service,
        status.status_message,
        now.format("%Y-%m-%d %H:%M:%S"),
    );
    if let Some(web_ui) = &status.web_ui {
        body.push_str(&format!("\nIf you can see this email at {web_ui},\nyour email configuration is working perfectly!\n"));
    }
    body.push_str("\nHappy Secret Santa organizing! 🎅\n");
    EmailMessage::to(recipient, "🎄 Test Email from Wichteln App", body)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
