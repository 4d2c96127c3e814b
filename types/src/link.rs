//! Wrapped-link registry records.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the account that owns wrapped links.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A slug → destination mapping registered by an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedLink {
    pub slug: String,
    pub target_url: String,
    pub owner_id: OwnerId,
    pub created_at: Timestamp,
}

/// An account entitled to serve wrapped links.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOwner {
    pub id: OwnerId,
    /// Subscription expiry. Links stop resolving once this passes.
    pub valid_until: Timestamp,
    /// API key for the owner's ad-shortener account.
    pub shortener_key: Option<String>,
}

impl LinkOwner {
    /// Whether the owner's subscription is still active at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.valid_until > now
    }

    /// The shortener key, ignoring blank values.
    pub fn shortener_key(&self) -> Option<&str> {
        self.shortener_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_expires_at_valid_until() {
        let owner = LinkOwner {
            id: OwnerId::new("alice"),
            valid_until: Timestamp::new(1_000),
            shortener_key: None,
        };
        assert!(owner.is_active(Timestamp::new(999)));
        assert!(!owner.is_active(Timestamp::new(1_000)));
    }

    #[test]
    fn blank_shortener_key_counts_as_missing() {
        let owner = LinkOwner {
            id: OwnerId::new("bob"),
            valid_until: Timestamp::new(1),
            shortener_key: Some("   ".into()),
        };
        assert_eq!(owner.shortener_key(), None);
    }
}
