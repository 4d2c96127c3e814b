//! linkgate gateway core.
//!
//! The node crate owns everything between the HTTP surface and the storage
//! and verification crates:
//! - Configuration ([`GatewayConfig`]) and backend selection ([`Stores`])
//! - The two-phase generate/resolve orchestrator ([`Resolver`])
//! - The ad-shortener client ([`LinkShortifyClient`])
//! - The expired-session reaper and graceful shutdown
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod metrics;
pub mod reaper;
pub mod resolver;
pub mod shortener;
pub mod shutdown;
pub mod storage;
pub mod tracing_spans;

pub use config::{CaptchaProvider, GatewayConfig, PolicyName, StorageBackend};
pub use error::NodeError;
pub use metrics::GatewayMetrics;
pub use reaper::{join_reaper, reap_once, spawn_reaper};
pub use resolver::{GenerateRequest, Generated, RequestOrigin, Resolver};
pub use shortener::{LinkShortifyClient, Shortener, ShortenerError};
pub use shutdown::ShutdownController;
pub use storage::Stores;
