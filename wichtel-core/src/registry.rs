//! Ordered, in-memory participant registry for a single event.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::participant::{normalize_email, normalize_name, Participant};

/// Participants of one event, in insertion order.
///
/// The first participant added becomes the admin (event creator) and cannot
/// be removed. Names and emails are unique within the registry.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    by_name: IndexMap<String, Participant>,
}

impl ParticipantRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a participant.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] for a malformed name or email and
    /// [`CoreError::DuplicateParticipant`] if the name or email is taken.
    pub fn add(&mut self, name: &str, email: &str) -> Result<Participant, CoreError> {
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;

        if self.by_name.contains_key(&name) {
            return Err(CoreError::DuplicateParticipant { field: "name", value: name });
        }
        if self.by_name.values().any(|p| p.email == email) {
            return Err(CoreError::DuplicateParticipant { field: "email", value: email });
        }

        let participant = Participant { name: name.clone(), email, is_admin: self.is_empty() };
        self.by_name.insert(name, participant.clone());
        Ok(participant)
    }

    /// Remove a participant by name, preserving the order of the others.
    ///
    /// # Errors
    /// Returns [`CoreError::ParticipantNotFound`] for an unknown name and
    /// [`CoreError::AdminProtected`] for the admin; the registry is left
    /// unchanged in both cases.
    pub fn remove(&mut self, name: &str) -> Result<Participant, CoreError> {
        let key = name.split_whitespace().collect::<Vec<_>>().join(" ");
        match self.by_name.get(&key) {
            None => Err(CoreError::ParticipantNotFound { name: key }),
            Some(p) if p.is_admin => Err(CoreError::AdminProtected { name: key }),
            Some(_) => self
                .by_name
                .shift_remove(&key)
                .ok_or(CoreError::ParticipantNotFound { name: key }),
        }
    }

    /// Look up a participant by exact (normalised) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.by_name.get(name)
    }

    /// The event creator, if anyone has joined yet.
    #[must_use]
    pub fn admin(&self) -> Option<&Participant> {
        self.by_name.values().find(|p| p.is_admin)
    }

    /// Iterate participants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.by_name.values()
    }

    /// Clone the participants into an ordered list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Participant> {
        self.by_name.values().cloned().collect()
    }

    /// Number of registered participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no participant is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Drop every participant, admin included.
    pub fn clear(&mut self) {
        self.by_name.clear();
    }
}
