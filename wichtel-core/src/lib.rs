//! Core types for the Wichtel gift-exchange organizer.
//!
//! Defines participants and their registry, the derangement engine that pairs
//! givers with receivers, one-time confirmation tokens with the pending-batch
//! store, and the email message value passed to mail backends.
//!
//! Nothing in this crate performs I/O or locking; the session layer in
//! `wichtel-mail` serialises access.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod assignment;
pub mod error;
pub mod gate;
pub mod id;
pub mod message;
pub mod participant;
pub mod pending;
pub mod registry;
pub mod token;

pub use assignment::{generate, generate_with_rng, Assignment, MAX_SHUFFLE_ATTEMPTS, MIN_PARTICIPANTS};
pub use error::CoreError;
pub use gate::HumanCheck;
pub use id::EventId;
pub use message::EmailMessage;
pub use participant::Participant;
pub use pending::{PendingBatch, PendingStore};
pub use registry::ParticipantRegistry;
pub use token::{ConfirmationToken, TokenFingerprint};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_display_round_trips_through_from_str() {
        let id = EventId::new();
        let parsed: EventId = match id.to_string().parse() {
            Ok(p) => p,
            Err(e) => panic!("unexpected parse error: {e}"),
        };
        assert_eq!(parsed, id);
    }

    #[test]
    fn event_id_serializes_as_bare_uuid() {
        let id = EventId::new();
        let json = match serde_json::to_string(&id) {
            Ok(s) => s,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn email_message_accessors_return_constructor_values() {
        let message = EmailMessage::to("a@x.com", "Hello", "Body").with_html_body("<p>Body</p>");
        assert_eq!(message.recipients(), ["a@x.com".to_owned()]);
        assert_eq!(message.subject(), "Hello");
        assert_eq!(message.body(), "Body");
        assert_eq!(message.html_body(), Some("<p>Body</p>"));
    }

    #[test]
    fn email_message_without_html_has_none() {
        let message = EmailMessage::new(vec!["a@x.com".into(), "b@x.com".into()], "s", "b");
        assert_eq!(message.recipients().len(), 2);
        assert!(message.html_body().is_none());
    }

    #[test]
    fn registry_snapshot_feeds_assignment_engine() {
        let mut registry = ParticipantRegistry::new();
        for (name, email) in [("Alice", "a@x.com"), ("Bob", "b@x.com"), ("Cleo", "c@x.com")] {
            if let Err(e) = registry.add(name, email) {
                panic!("failed to add {name}: {e}");
            }
        }
        let assignments = match generate(&registry.to_vec()) {
            Ok(a) => a,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(assignments.len(), 3);
        assert!(assignments.iter().all(|a| a.giver != a.receiver));
    }

    #[test]
    fn human_check_gate_rejects_unverified() {
        assert!(HumanCheck::from(true).require().is_ok());
        assert!(matches!(
            HumanCheck::from(false).require(),
            Err(CoreError::HumanVerificationFailed)
        ));
    }

    #[test]
    fn core_error_messages_are_user_facing() {
        let err = CoreError::InsufficientParticipants { required: 2, actual: 1 };
        assert_eq!(
            err.to_string(),
            "need at least 2 participants to assign gift partners, got 1"
        );
        assert_eq!(CoreError::TokenNotFound.to_string(), "invalid or expired confirmation link");
    }
}
