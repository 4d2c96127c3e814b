//! In-process backends: thread-safe maps behind a mutex.
//!
//! Suitable for a single gateway process. Sessions are lost on restart, which
//! only costs in-flight resolutions their six-minute window.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use linkgate_types::{
    Fingerprint, LinkOwner, OwnerId, ResolutionSession, SessionToken, Timestamp, WrappedLink,
};

use crate::{ConsumeOutcome, LinkStore, SessionStore, StoreError, MAX_TOKEN_ATTEMPTS};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
}

/// Session store backed by a `HashMap` under one mutex.
///
/// `mark_consumed` checks and flips the latch while holding the lock, so the
/// compare-and-set cannot interleave with another caller.
pub struct MemorySessionStore {
    ttl_secs: u64,
    sessions: Mutex<HashMap<SessionToken, ResolutionSession>>,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn create(
        &self,
        target_url: &str,
        fingerprint: Fingerprint,
        now: Timestamp,
    ) -> Result<SessionToken, StoreError> {
        let mut sessions = lock(&self.sessions)?;
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = SessionToken::generate()?;
            if sessions.contains_key(&token) {
                continue;
            }
            sessions.insert(
                token.clone(),
                ResolutionSession::new(token.clone(), target_url, fingerprint, now),
            );
            return Ok(token);
        }
        Err(StoreError::Duplicate("session token collision".into()))
    }

    fn get(&self, token: &SessionToken, now: Timestamp) -> Result<ResolutionSession, StoreError> {
        lock(&self.sessions)?
            .get(token)
            .filter(|s| !s.is_expired(self.ttl_secs, now))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(token.to_string()))
    }

    fn mark_consumed(
        &self,
        token: &SessionToken,
        now: Timestamp,
    ) -> Result<ConsumeOutcome, StoreError> {
        let mut sessions = lock(&self.sessions)?;
        let Some(session) = sessions.get_mut(token) else {
            return Ok(ConsumeOutcome::NotFound);
        };
        if session.is_expired(self.ttl_secs, now) {
            return Ok(ConsumeOutcome::NotFound);
        }
        if session.consumed {
            return Ok(ConsumeOutcome::AlreadyConsumed);
        }
        session.consumed = true;
        Ok(ConsumeOutcome::Consumed(session.clone()))
    }

    fn purge_expired(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl_secs, now));
        Ok(before - sessions.len())
    }

    fn session_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.sessions)?.len() as u64)
    }
}

/// Link registry backed by two maps.
#[derive(Default)]
pub struct MemoryLinkStore {
    links: Mutex<HashMap<String, WrappedLink>>,
    owners: Mutex<HashMap<OwnerId, LinkOwner>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkStore for MemoryLinkStore {
    fn put_link(&self, link: &WrappedLink) -> Result<(), StoreError> {
        let mut links = lock(&self.links)?;
        if links.contains_key(&link.slug) {
            return Err(StoreError::Duplicate(link.slug.clone()));
        }
        links.insert(link.slug.clone(), link.clone());
        Ok(())
    }

    fn get_link(&self, slug: &str) -> Result<WrappedLink, StoreError> {
        lock(&self.links)?
            .get(slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("link '{slug}'")))
    }

    fn link_exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.links)?.contains_key(slug))
    }

    fn put_owner(&self, owner: &LinkOwner) -> Result<(), StoreError> {
        lock(&self.owners)?.insert(owner.id.clone(), owner.clone());
        Ok(())
    }

    fn get_owner(&self, id: &OwnerId) -> Result<LinkOwner, StoreError> {
        lock(&self.owners)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("owner '{id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    const TTL: u64 = 360;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(TTL)
    }

    #[test]
    fn create_then_get() {
        let s = store();
        let now = Timestamp::new(1_000);
        let token = s.create("https://example.com", Fingerprint::loopback(), now).unwrap();
        let session = s.get(&token, now).unwrap();
        assert_eq!(session.target_url, "https://example.com");
        assert_eq!(session.created_at, now);
        assert!(!session.consumed);
    }

    #[test]
    fn unknown_token_is_not_found() {
        let s = store();
        let token = SessionToken::from_bytes(&[9; 16]);
        assert!(s.get(&token, Timestamp::new(0)).unwrap_err().is_not_found());
        assert_eq!(
            s.mark_consumed(&token, Timestamp::new(0)).unwrap(),
            ConsumeOutcome::NotFound
        );
    }

    #[test]
    fn consume_succeeds_once() {
        let s = store();
        let now = Timestamp::new(1_000);
        let token = s.create("https://example.com", Fingerprint::loopback(), now).unwrap();
        match s.mark_consumed(&token, now).unwrap() {
            ConsumeOutcome::Consumed(session) => {
                assert_eq!(session.target_url, "https://example.com");
                assert!(session.consumed);
            }
            other => panic!("expected Consumed, got {other:?}"),
        }
        assert_eq!(
            s.mark_consumed(&token, now).unwrap(),
            ConsumeOutcome::AlreadyConsumed
        );
        // Still readable, just latched.
        assert!(s.get(&token, now).unwrap().consumed);
    }

    #[test]
    fn expired_sessions_are_invisible_before_purge() {
        let s = store();
        let created = Timestamp::new(1_000);
        let token = s.create("https://example.com", Fingerprint::loopback(), created).unwrap();
        let later = created.plus_secs(TTL);
        assert!(s.get(&token, later).unwrap_err().is_not_found());
        assert_eq!(s.mark_consumed(&token, later).unwrap(), ConsumeOutcome::NotFound);
        assert_eq!(s.session_count().unwrap(), 1);
    }

    #[test]
    fn purge_removes_only_expired() {
        let s = store();
        let old = s
            .create("https://old.example", Fingerprint::loopback(), Timestamp::new(0))
            .unwrap();
        let fresh = s
            .create("https://new.example", Fingerprint::loopback(), Timestamp::new(300))
            .unwrap();
        assert_eq!(s.purge_expired(Timestamp::new(400)).unwrap(), 1);
        assert_eq!(s.session_count().unwrap(), 1);
        assert!(s.get(&old, Timestamp::new(400)).is_err());
        assert!(s.get(&fresh, Timestamp::new(400)).is_ok());
    }

    #[test]
    fn consumed_sessions_are_purged_too() {
        let s = store();
        let token = s
            .create("https://example.com", Fingerprint::loopback(), Timestamp::new(0))
            .unwrap();
        s.mark_consumed(&token, Timestamp::new(1)).unwrap();
        assert_eq!(s.purge_expired(Timestamp::new(TTL)).unwrap(), 1);
    }

    // Concurrency-critical: the consumed latch must never be won twice.
    #[test]
    fn concurrent_consume_has_exactly_one_winner() {
        const THREADS: usize = 16;
        let s = Arc::new(store());
        let now = Timestamp::new(1_000);
        let token = s.create("https://example.com", Fingerprint::loopback(), now).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let s = Arc::clone(&s);
                let token = token.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    s.mark_consumed(&token, now).unwrap()
                })
            })
            .collect();

        let outcomes: Vec<ConsumeOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = outcomes
            .iter()
            .filter(|o| matches!(o, ConsumeOutcome::Consumed(_)))
            .count();
        let losers = outcomes
            .iter()
            .filter(|o| **o == ConsumeOutcome::AlreadyConsumed)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, THREADS - 1);
    }

    #[test]
    fn link_slugs_are_unique() {
        let links = MemoryLinkStore::new();
        let link = WrappedLink {
            slug: "abc123".into(),
            target_url: "https://example.com".into(),
            owner_id: OwnerId::new("alice"),
            created_at: Timestamp::new(0),
        };
        links.put_link(&link).unwrap();
        assert!(links.link_exists("abc123").unwrap());
        assert!(matches!(links.put_link(&link), Err(StoreError::Duplicate(_))));
        assert_eq!(links.get_link("abc123").unwrap(), link);
        assert!(links.get_link("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn owners_upsert() {
        let links = MemoryLinkStore::new();
        let mut owner = LinkOwner {
            id: OwnerId::new("alice"),
            valid_until: Timestamp::new(10),
            shortener_key: None,
        };
        links.put_owner(&owner).unwrap();
        owner.shortener_key = Some("key".into());
        links.put_owner(&owner).unwrap();
        assert_eq!(links.get_owner(&owner.id).unwrap(), owner);
    }
}
