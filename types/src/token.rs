//! Opaque single-use session tokens.

use crate::LinkgateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind each token (128 bits of entropy).
pub const TOKEN_BYTES: usize = 16;

/// A resolution-session token: 16 random bytes rendered as 32 lowercase hex
/// characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a fresh token from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, LinkgateError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| LinkgateError::Entropy(e.to_string()))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Build a token from raw bytes (deterministic; used by tests and imports).
    pub fn from_bytes(bytes: &[u8; TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a token received from a client.
    ///
    /// Only well-formed tokens are accepted so arbitrary request input never
    /// reaches a storage key lookup.
    pub fn parse(raw: &str) -> Result<Self, LinkgateError> {
        let raw = raw.trim();
        if raw.len() != TOKEN_BYTES * 2 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LinkgateError::InvalidToken(format!(
                "expected {} hex characters",
                TOKEN_BYTES * 2
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
