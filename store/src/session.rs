//! Resolution session storage trait.

use crate::StoreError;
use linkgate_types::{Fingerprint, ResolutionSession, SessionToken, Timestamp};

/// How many fresh tokens `create` may try before giving up on collisions.
/// With 128-bit tokens a second attempt is already astronomically unlikely.
pub const MAX_TOKEN_ATTEMPTS: usize = 4;

/// Result of the anti-replay compare-and-set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This call flipped the latch. Carries the session as it was consumed;
    /// no other call will ever see this variant for the same token.
    Consumed(ResolutionSession),
    /// Another call consumed the session first.
    AlreadyConsumed,
    /// Unknown token, or the TTL window has elapsed.
    NotFound,
}

/// Trait for the TTL-bounded, exactly-once-consumable session store.
///
/// Every method takes the current time explicitly so expiry is decided by the
/// store itself and tests can drive time deterministically. Sessions older
/// than [`SessionStore::ttl_secs`] are invisible to `get` and `mark_consumed`
/// whether or not they have been reaped yet.
pub trait SessionStore: Send + Sync {
    /// Session lifetime in seconds.
    fn ttl_secs(&self) -> u64;

    /// Store a new unconsumed session under a freshly generated token.
    fn create(
        &self,
        target_url: &str,
        fingerprint: Fingerprint,
        now: Timestamp,
    ) -> Result<SessionToken, StoreError>;

    /// Look up a live session. `StoreError::NotFound` if the token never
    /// existed or its TTL has elapsed.
    fn get(&self, token: &SessionToken, now: Timestamp) -> Result<ResolutionSession, StoreError>;

    /// Atomically transition `consumed` from `false` to `true`.
    ///
    /// Concurrent calls for the same token must yield exactly one
    /// [`ConsumeOutcome::Consumed`].
    fn mark_consumed(
        &self,
        token: &SessionToken,
        now: Timestamp,
    ) -> Result<ConsumeOutcome, StoreError>;

    /// Delete every session whose TTL has elapsed. Returns how many were removed.
    fn purge_expired(&self, now: Timestamp) -> Result<usize, StoreError>;

    /// Number of stored sessions, including expired ones not yet purged.
    fn session_count(&self) -> Result<u64, StoreError>;
}
