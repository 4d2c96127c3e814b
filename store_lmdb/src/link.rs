//! LMDB implementation of LinkStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use linkgate_store::{LinkStore, StoreError};
use linkgate_types::{LinkOwner, OwnerId, WrappedLink};

use crate::LmdbError;

pub struct LmdbLinkStore {
    pub(crate) env: Arc<Env>,
    pub(crate) links_db: Database<Bytes, Bytes>,
    pub(crate) owners_db: Database<Bytes, Bytes>,
}

impl LinkStore for LmdbLinkStore {
    fn put_link(&self, link: &WrappedLink) -> Result<(), StoreError> {
        let value = bincode::serialize(link).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .links_db
            .get(&wtxn, link.slug.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(link.slug.clone()));
        }
        self.links_db
            .put(&mut wtxn, link.slug.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_link(&self, slug: &str) -> Result<WrappedLink, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .links_db
            .get(&rtxn, slug.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("link '{slug}'")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn link_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .links_db
            .get(&rtxn, slug.as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn put_owner(&self, owner: &LinkOwner) -> Result<(), StoreError> {
        let value = bincode::serialize(owner).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.owners_db
            .put(&mut wtxn, owner.id.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_owner(&self, id: &OwnerId) -> Result<LinkOwner, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .owners_db
            .get(&rtxn, id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("owner '{id}'")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }
}
