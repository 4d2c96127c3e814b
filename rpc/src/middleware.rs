//! Request filters applied to every route.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::{AppState, RpcError};

/// Whether `Referer` or `Origin` contains any blocked pattern (case-insensitive).
pub fn is_blocked(headers: &HeaderMap, blocked: &[String]) -> bool {
    [header::REFERER, header::ORIGIN]
        .iter()
        .filter_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .map(str::to_ascii_lowercase)
        .any(|value| {
            blocked
                .iter()
                .filter(|p| !p.trim().is_empty())
                .any(|pattern| value.contains(&pattern.trim().to_ascii_lowercase()))
        })
}

/// Refuse requests coming from blocked origins with `403 ACCESS_DENIED`.
pub async fn block_origins(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_blocked(request.headers(), &state.settings.blocked_origins) {
        warn!(path = %request.uri().path(), "request from blocked origin refused");
        return RpcError::AccessDenied.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn matches_referer_or_origin_case_insensitively() {
        let blocked = vec!["railway.app".to_string()];
        let mut h = HeaderMap::new();
        h.insert(header::REFERER, HeaderValue::from_static("https://x.RAILWAY.app/page"));
        assert!(is_blocked(&h, &blocked));

        let mut h = HeaderMap::new();
        h.insert(header::ORIGIN, HeaderValue::from_static("https://lksfy.com"));
        assert!(!is_blocked(&h, &blocked));
        assert!(!is_blocked(&HeaderMap::new(), &blocked));
    }

    #[test]
    fn blank_patterns_block_nothing() {
        let mut h = HeaderMap::new();
        h.insert(header::ORIGIN, HeaderValue::from_static("https://a.example"));
        assert!(!is_blocked(&h, &["  ".to_string()]));
    }
}
