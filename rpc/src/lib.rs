//! HTTP API for the linkgate gateway.
//!
//! Provides endpoints for:
//! - Session generation (`POST /api/v5/generate`) with the browser-binding cookie
//! - Session resolution (`POST`/`GET /api/v5/resolve`, `GET /v5/resolve/{token}`)
//! - Link existence checks (`GET /api/v5/link/get`)
//! - The V4 link codec (`POST /api/v4`, `POST /api/v4/redirect`)
//! - Prometheus metrics (`GET /metrics`)

pub mod client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::RpcError;
pub use server::{build_router, AppState, HttpSettings, RpcServer};
