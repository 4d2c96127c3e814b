//! Storage traits for linkgate.
//!
//! Every storage backend (LMDB, in-memory) implements these traits. The rest
//! of the codebase depends only on the traits.

pub mod error;
pub mod link;
pub mod memory;
pub mod session;

pub use error::StoreError;
pub use link::LinkStore;
pub use memory::{MemoryLinkStore, MemorySessionStore};
pub use session::{ConsumeOutcome, SessionStore, MAX_TOKEN_ATTEMPTS};
