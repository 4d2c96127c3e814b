//! Opening the configured storage backend.

use std::sync::Arc;

use linkgate_store::{LinkStore, MemoryLinkStore, MemorySessionStore, SessionStore};
use linkgate_store_lmdb::environment::DEFAULT_MAP_SIZE;
use linkgate_store_lmdb::LmdbEnvironment;
use tracing::info;

use crate::config::{GatewayConfig, StorageBackend};
use crate::NodeError;

/// Session and link stores sharing one backend.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub links: Arc<dyn LinkStore>,
}

impl Stores {
    pub fn in_memory(session_ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new(session_ttl_secs)),
            links: Arc::new(MemoryLinkStore::new()),
        }
    }

    pub fn lmdb(env: &LmdbEnvironment, session_ttl_secs: u64) -> Self {
        Self {
            sessions: Arc::new(env.session_store(session_ttl_secs)),
            links: Arc::new(env.link_store()),
        }
    }

    /// Open whatever `config.storage` names.
    pub fn open(config: &GatewayConfig) -> Result<Self, NodeError> {
        let ttl = config.gate.session_ttl_secs;
        match config.storage {
            StorageBackend::Memory => {
                info!("using in-memory storage; state is lost on restart");
                Ok(Self::in_memory(ttl))
            }
            StorageBackend::Lmdb => {
                let env = LmdbEnvironment::open(&config.data_dir, DEFAULT_MAP_SIZE)?;
                Ok(Self::lmdb(&env, ttl))
            }
        }
    }
}
