//! The resolution session record.

use crate::{Fingerprint, SessionToken, Timestamp};
use serde::{Deserialize, Serialize};

/// One in-flight resolution attempt.
///
/// The session carries its own copy of the target so resolution never has to
/// consult the link registry again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSession {
    pub token: SessionToken,
    /// Real destination. Set at creation and never changed.
    pub target_url: String,
    pub fingerprint: Fingerprint,
    pub created_at: Timestamp,
    /// Anti-replay latch: flips to `true` exactly once.
    pub consumed: bool,
}

impl ResolutionSession {
    pub fn new(
        token: SessionToken,
        target_url: impl Into<String>,
        fingerprint: Fingerprint,
        created_at: Timestamp,
    ) -> Self {
        Self {
            token,
            target_url: target_url.into(),
            fingerprint,
            created_at,
            consumed: false,
        }
    }

    /// Whether the session's TTL window has elapsed at `now`.
    pub fn is_expired(&self, ttl_secs: u64, now: Timestamp) -> bool {
        self.created_at.has_expired(ttl_secs, now)
    }

    /// Seconds since the session was created.
    pub fn age(&self, now: Timestamp) -> u64 {
        self.created_at.elapsed_since(now)
    }
}
