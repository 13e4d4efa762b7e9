//! One-time confirmation tokens.
//!
//! A token is 256 bits from the operating system CSPRNG, encoded as URL-safe
//! base64 without padding so it can be embedded in a link verbatim. Tokens are
//! secrets: `Debug` prints only a short SHA-256 fingerprint and there is no
//! `Display` impl, so `%token` in a log line does not compile.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Number of random bytes in a token.
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token (`ceil(32 * 4 / 3)` without padding).
pub const TOKEN_LEN: usize = 43;

/// An unguessable, single-use confirmation token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Draw a fresh token from the OS entropy pool.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parse a token received from a client.
    ///
    /// # Errors
    /// Returns [`CoreError::TokenNotFound`] if the string cannot be a token;
    /// callers never learn whether a token was malformed or merely unknown.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.len() != TOKEN_LEN {
            return Err(CoreError::TokenNotFound);
        }
        match URL_SAFE_NO_PAD.decode(raw) {
            Ok(bytes) if bytes.len() == TOKEN_BYTES => Ok(Self(raw.to_owned())),
            _ => Err(CoreError::TokenNotFound),
        }
    }

    /// The encoded token, for building confirmation links.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// A short, non-reversible identifier that is safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> TokenFingerprint {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut prefix = [0u8; 6];
        prefix.copy_from_slice(&digest[..6]);
        TokenFingerprint(prefix)
    }
}

impl fmt::Debug for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfirmationToken({})", self.fingerprint())
    }
}

/// First 48 bits of the SHA-256 of a token, rendered as 12 hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenFingerprint([u8; 6]);

impl fmt::Display for TokenFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
