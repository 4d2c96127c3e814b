//! LMDB storage backend for linkgate.
//!
//! Implements the storage traits from `linkgate-store` using the `heed` LMDB
//! bindings. Sessions, links, and owners each get their own named database
//! inside a single environment. Values are bincode-encoded.

pub mod environment;
pub mod error;
pub mod link;
pub mod session;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use link::LmdbLinkStore;
pub use session::LmdbSessionStore;
