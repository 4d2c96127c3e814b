//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for value-level failures in linkgate.
#[derive(Debug, Error)]
pub enum LinkgateError {
    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("random source unavailable: {0}")]
    Entropy(String),
}
