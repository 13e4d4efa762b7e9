//! Fuzz target: participant name and email normalisation.
//!
//! Accepted values must be stable under a second normalisation pass and
//! stay within the documented length bounds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wichtel_core::participant::{normalize_email, normalize_name, NAME_MAX_LEN, NAME_MIN_LEN};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (name, email) = text.split_once('\n').unwrap_or((text, text));

    if let Ok(normalized) = normalize_name(name) {
        let len = normalized.chars().count();
        assert!((NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len));
        assert_eq!(normalize_name(&normalized).ok().as_deref(), Some(normalized.as_str()));
    }

    if let Ok(normalized) = normalize_email(email) {
        assert_eq!(normalized, normalized.to_lowercase());
        assert_eq!(normalize_email(&normalized).ok().as_deref(), Some(normalized.as_str()));
    }
});
