//! Shared utilities for linkgate.

pub mod logging;
pub mod redact;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use redact::mask_secret;
pub use time::format_duration;
