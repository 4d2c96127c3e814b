//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (wall-clock time, the CAPTCHA oracle, the link
//! shortener) sit behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod shortener;
pub mod verifier;

pub use clock::NullClock;
pub use shortener::NullShortener;
pub use verifier::NullHumanVerifier;
