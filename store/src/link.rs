//! Wrapped-link registry storage trait.

use crate::StoreError;
use linkgate_types::{LinkOwner, OwnerId, WrappedLink};

/// Trait for the slug → target registry and the owners behind it.
pub trait LinkStore: Send + Sync {
    /// Insert a new link. `StoreError::Duplicate` if the slug is taken.
    fn put_link(&self, link: &WrappedLink) -> Result<(), StoreError>;

    /// Retrieve a link by slug.
    fn get_link(&self, slug: &str) -> Result<WrappedLink, StoreError>;

    /// Whether a slug is already registered.
    fn link_exists(&self, slug: &str) -> Result<bool, StoreError>;

    /// Insert or replace an owner record.
    fn put_owner(&self, owner: &LinkOwner) -> Result<(), StoreError>;

    /// Retrieve an owner by id.
    fn get_owner(&self, id: &OwnerId) -> Result<LinkOwner, StoreError>;
}
