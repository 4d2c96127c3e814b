//! LMDB implementation of SessionStore.
//!
//! Keys are the token's hex string; values are bincode-encoded
//! `ResolutionSession`s. LMDB allows a single writer at a time, so doing the
//! read, the latch check, and the write inside one write transaction makes
//! `mark_consumed` an atomic compare-and-set across threads.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};
use tracing::debug;

use linkgate_store::{ConsumeOutcome, SessionStore, StoreError, MAX_TOKEN_ATTEMPTS};
use linkgate_types::{Fingerprint, ResolutionSession, SessionToken, Timestamp};

use crate::LmdbError;

pub struct LmdbSessionStore {
    pub(crate) env: Arc<Env>,
    pub(crate) sessions_db: Database<Bytes, Bytes>,
    pub(crate) ttl_secs: u64,
}

fn decode(bytes: &[u8]) -> Result<ResolutionSession, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

fn encode(session: &ResolutionSession) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(session)?)
}

impl LmdbSessionStore {
    fn consume(&self, token: &SessionToken, now: Timestamp) -> Result<ConsumeOutcome, LmdbError> {
        let key = token.as_str().as_bytes();
        let mut wtxn = self.env.write_txn()?;
        let Some(bytes) = self.sessions_db.get(&wtxn, key)? else {
            return Ok(ConsumeOutcome::NotFound);
        };
        let mut session = decode(bytes)?;
        if session.is_expired(self.ttl_secs, now) {
            return Ok(ConsumeOutcome::NotFound);
        }
        if session.consumed {
            return Ok(ConsumeOutcome::AlreadyConsumed);
        }
        session.consumed = true;
        let value = encode(&session)?;
        self.sessions_db.put(&mut wtxn, key, &value)?;
        wtxn.commit()?;
        Ok(ConsumeOutcome::Consumed(session))
    }

    fn purge(&self, now: Timestamp) -> Result<usize, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let mut expired = Vec::new();
        for entry in self.sessions_db.iter(&wtxn)? {
            let (key, bytes) = entry?;
            match decode(bytes) {
                Ok(session) if !session.is_expired(self.ttl_secs, now) => {}
                // Undecodable records can never be resolved; reap them too.
                _ => expired.push(key.to_vec()),
            }
        }
        for key in &expired {
            self.sessions_db.delete(&mut wtxn, key)?;
        }
        wtxn.commit()?;
        Ok(expired.len())
    }
}

impl SessionStore for LmdbSessionStore {
    fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn create(
        &self,
        target_url: &str,
        fingerprint: Fingerprint,
        now: Timestamp,
    ) -> Result<SessionToken, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = SessionToken::generate()?;
            let key = token.as_str().as_bytes();
            if self
                .sessions_db
                .get(&wtxn, key)
                .map_err(LmdbError::from)?
                .is_some()
            {
                continue;
            }
            let session = ResolutionSession::new(token.clone(), target_url, fingerprint, now);
            let value = encode(&session)?;
            self.sessions_db
                .put(&mut wtxn, key, &value)
                .map_err(LmdbError::from)?;
            wtxn.commit().map_err(LmdbError::from)?;
            return Ok(token);
        }
        Err(StoreError::Duplicate("session token collision".into()))
    }

    fn get(&self, token: &SessionToken, now: Timestamp) -> Result<ResolutionSession, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .sessions_db
            .get(&rtxn, token.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(token.to_string()))?;
        let session = decode(bytes)?;
        if session.is_expired(self.ttl_secs, now) {
            return Err(StoreError::NotFound(token.to_string()));
        }
        Ok(session)
    }

    fn mark_consumed(
        &self,
        token: &SessionToken,
        now: Timestamp,
    ) -> Result<ConsumeOutcome, StoreError> {
        Ok(self.consume(token, now)?)
    }

    fn purge_expired(&self, now: Timestamp) -> Result<usize, StoreError> {
        let removed = self.purge(now)?;
        if removed > 0 {
            debug!(removed, "purged expired sessions from LMDB");
        }
        Ok(removed)
    }

    fn session_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.sessions_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
