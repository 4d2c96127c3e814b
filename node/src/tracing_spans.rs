//! Pre-built [`tracing::Span`] constructors for gateway operations.
//!
//! Consistent span names and fields make it easy to follow one link or one
//! session through the logs.

use tracing::{info_span, Span};

/// Span covering the generate phase for one slug.
pub fn generate_span(slug: &str, client: &str) -> Span {
    info_span!("generate", slug = %slug, client = %client)
}

/// Span covering the resolve phase for one session.
pub fn resolve_span(token: &str, client: &str) -> Span {
    info_span!("resolve", token = %token, client = %client)
}

/// Span covering one sweep of the session reaper.
pub fn reap_span() -> Span {
    info_span!("reap")
}

/// Span covering a single HTTP request handled by the gateway.
pub fn http_span(method: &str, path: &str) -> Span {
    info_span!("http", method = %method, path = %path)
}
