//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::{LmdbError, LmdbLinkStore, LmdbSessionStore};

/// Named databases created inside the environment.
const SESSIONS_DB: &str = "sessions";
const LINKS_DB: &str = "links";
const OWNERS_DB: &str = "owners";

/// Default map size: 256 MiB is far more than six minutes of sessions need.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    sessions_db: Database<Bytes, Bytes>,
    links_db: Database<Bytes, Bytes>,
    owners_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process and the files are
        // not modified by anything other than this LMDB handle.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(3)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let sessions_db = env.create_database(&mut wtxn, Some(SESSIONS_DB))?;
        let links_db = env.create_database(&mut wtxn, Some(LINKS_DB))?;
        let owners_db = env.create_database(&mut wtxn, Some(OWNERS_DB))?;
        wtxn.commit()?;

        info!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            sessions_db,
            links_db,
            owners_db,
        })
    }

    /// Session store view over this environment.
    pub fn session_store(&self, ttl_secs: u64) -> LmdbSessionStore {
        LmdbSessionStore {
            env: Arc::clone(&self.env),
            sessions_db: self.sessions_db,
            ttl_secs,
        }
    }

    /// Link registry view over this environment.
    pub fn link_store(&self) -> LmdbLinkStore {
        LmdbLinkStore {
            env: Arc::clone(&self.env),
            links_db: self.links_db,
            owners_db: self.owners_db,
        }
    }
}
