//! Fuzz target: `ConfirmationToken::parse` on untrusted path segments.
//!
//! Parsing never panics, and anything accepted re-encodes to itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wichtel_core::ConfirmationToken;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(token) = ConfirmationToken::parse(&raw) {
        assert_eq!(token.expose(), raw);
        let _ = token.fingerprint().to_string();
    }
});
