//! Fundamental types for linkgate.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: timestamps and clocks, session tokens, client fingerprints,
//! resolution sessions, wrapped-link registry records, and gate parameters.

pub mod error;
pub mod fingerprint;
pub mod link;
pub mod params;
pub mod session;
pub mod time;
pub mod token;

pub use error::LinkgateError;
pub use fingerprint::Fingerprint;
pub use link::{LinkOwner, OwnerId, WrappedLink};
pub use params::GateParams;
pub use session::ResolutionSession;
pub use time::{Clock, SystemClock, Timestamp};
pub use token::SessionToken;
