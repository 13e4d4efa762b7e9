use std::str::FromStr;

use lettre::Address;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Minimum length of a participant name after whitespace normalisation.
pub const NAME_MIN_LEN: usize = 2;

/// Maximum length of a participant name after whitespace normalisation.
pub const NAME_MAX_LEN: usize = 50;

/// Throwaway mailbox providers whose addresses are refused at registration.
const BLOCKED_DOMAINS: &[&str] = &["10minutemail.com", "tempmail.org", "guerrillamail.com"];

/// A person taking part in a gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Participant {
    /// Display name, unique within an event.
    pub name: String,
    /// Lower-cased email address, unique within an event.
    pub email: String,
    /// Whether this participant created the event.
    pub is_admin: bool,
}

impl Participant {
    /// Validate and normalise a name/email pair into a participant.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] if either field is rejected by
    /// [`normalize_name`] or [`normalize_email`].
    pub fn new(name: &str, email: &str, is_admin: bool) -> Result<Self, CoreError> {
        Ok(Self {
            name: normalize_name(name)?,
            email: normalize_email(email)?,
            is_admin,
        })
    }
}

/// Trim a name, collapse inner whitespace, and check length and charset.
///
/// Letters (including non-ASCII letters such as umlauts), digits, spaces,
/// hyphens and apostrophes are accepted.
///
/// # Errors
/// Returns [`CoreError::Validation`] with `field = "name"`.
pub fn normalize_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if name.is_empty() {
        return Err(invalid_name("name is required"));
    }
    let len = name.chars().count();
    if len < NAME_MIN_LEN {
        return Err(invalid_name(format!("must be at least {NAME_MIN_LEN} characters long")));
    }
    if len > NAME_MAX_LEN {
        return Err(invalid_name(format!("must be at most {NAME_MAX_LEN} characters long")));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '\'')) {
        return Err(invalid_name(
            "can only contain letters, numbers, spaces, hyphens, and apostrophes",
        ));
    }
    Ok(name)
}

/// Trim and lower-case an email address, then check it parses as an RFC 5321
/// address and does not belong to a blocked disposable domain.
///
/// # Errors
/// Returns [`CoreError::Validation`] with `field = "email"`.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(invalid_email("email is required"));
    }

    let address = Address::from_str(&email).map_err(|e| invalid_email(e.to_string()))?;
    if !address.domain().contains('.') {
        return Err(invalid_email("domain must contain a dot"));
    }
    if BLOCKED_DOMAINS.contains(&address.domain()) {
        return Err(invalid_email("disposable email addresses are not allowed"));
    }
    Ok(email)
}

fn invalid_name(reason: impl Into<String>) -> CoreError {
    CoreError::Validation { field: "name", reason: reason.into() }
}

fn invalid_email(reason: impl Into<String>) -> CoreError {
    CoreError::Validation { field: "email", reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_collapses_whitespace() {
        let name = match normalize_name("  Anna   Maria  ") {
            Ok(n) => n,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(name, "Anna Maria");
    }

    #[test]
    fn normalize_name_accepts_umlauts_and_apostrophes() {
        assert!(normalize_name("Jürgen O'Neil-Brück").is_ok());
    }

    #[test]
    fn normalize_name_rejects_empty_and_short() {
        assert!(matches!(
            normalize_name("   "),
            Err(CoreError::Validation { field: "name", .. })
        ));
        assert!(normalize_name("A").is_err(), "single character names are too short");
    }

    #[test]
    fn normalize_name_rejects_markup() {
        assert!(normalize_name("<script>").is_err());
    }

    #[test]
    fn normalize_name_rejects_overlong() {
        let long = "a".repeat(NAME_MAX_LEN + 1);
        assert!(normalize_name(&long).is_err());
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        let email = match normalize_email("  Alice@Example.COM ") {
            Ok(e) => e,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(email, "alice@example.com");
    }

    #[test]
    fn normalize_email_rejects_malformed() {
        for bad in ["", "alice", "alice@", "@example.com", "alice@localhost"] {
            assert!(
                matches!(normalize_email(bad), Err(CoreError::Validation { field: "email", .. })),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn normalize_email_rejects_disposable_domains() {
        assert!(normalize_email("someone@tempmail.org").is_err());
    }
}
