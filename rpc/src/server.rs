//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use linkgate_node::tracing_spans::http_span;
use linkgate_node::{GatewayConfig, NodeError, Resolver};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::RpcError;
use crate::handlers;

/// HTTP-layer settings derived from [`GatewayConfig`].
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub trust_forwarded_for: bool,
    pub blocked_origins: Vec<String>,
    pub cors_origins: Vec<String>,
    pub enable_metrics: bool,
    pub cookie_name: String,
    pub session_ttl_secs: u64,
    /// Add `Secure` to the session cookie.
    pub secure_cookie: bool,
}

impl HttpSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            trust_forwarded_for: config.trust_forwarded_for,
            blocked_origins: config.blocked_origins.clone(),
            cors_origins: config.cors_origins.clone(),
            enable_metrics: config.enable_metrics,
            cookie_name: config.gate.cookie_name.clone(),
            session_ttl_secs: config.gate.session_ttl_secs,
            secure_cookie: config.security_policy().is_strict(),
        }
    }

    /// `Set-Cookie` value binding the browser to a session.
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={token}; HttpOnly; SameSite=Lax; Max-Age={}; Path=/",
            self.cookie_name, self.session_ttl_secs
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(resolver: Arc<Resolver>, settings: HttpSettings) -> Self {
        Self {
            resolver,
            settings: Arc::new(settings),
        }
    }
}

/// Build the complete router.
///
/// ```text
/// POST /api/v5/generate        mint a session, set the binding cookie
/// POST /api/v5/resolve         gate + target as JSON
/// GET  /api/v5/resolve?token=  gate + 302 to target
/// GET  /v5/resolve/{token}     gate + 302 to target (shortener landing URL)
/// GET  /api/v5/link/get?slug=  link existence
/// POST /api/v4                 V4 encode
/// POST /api/v4/redirect        V4 decode
/// GET  /metrics                Prometheus text format (optional)
/// GET  /health
/// ```
///
/// Fails when `cors_origins` cannot be turned into a CORS policy.
pub fn build_router(state: AppState) -> Result<Router, RpcError> {
    let mut router = Router::new()
        .route("/api/v5/generate", post(handlers::generate))
        .route(
            "/api/v5/resolve",
            post(handlers::resolve_json).get(handlers::resolve_redirect),
        )
        .route("/v5/resolve/:token", get(handlers::resolve_path))
        .route("/api/v5/link/get", get(handlers::link_get))
        .route("/api/v4", post(handlers::encode_v4))
        .route("/api/v4/redirect", post(handlers::decode_v4))
        .route("/health", get(handlers::health));

    if state.settings.enable_metrics {
        router = router.route("/metrics", get(handlers::metrics));
    }

    let cors = cors_layer(&state.settings.cors_origins)?;
    Ok(router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::block_origins,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            http_span(request.method().as_str(), request.uri().path())
        }))
        .with_state(state))
}

/// Credentialed CORS for an explicit origin list.
///
/// A wildcard cannot be combined with cookies, so `*` is a config error.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, RpcError> {
    if origins.iter().any(|o| o.trim() == "*") {
        return Err(NodeError::Config(
            "cors_origins may not contain \"*\"; list each allowed origin".into(),
        )
        .into());
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// The gateway's HTTP listener.
pub struct RpcServer {
    pub listen_addr: String,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(listen_addr: impl Into<String>, state: AppState) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state,
        }
    }

    /// Serve until `shutdown` completes.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state.clone())?;
        let listener = tokio::net::TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.listen_addr)))?;
        info!("HTTP server listening on {}", self.listen_addr);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_binding_attributes() {
        let mut settings = HttpSettings::from_config(&GatewayConfig::default());
        assert_eq!(
            settings.session_cookie("abc"),
            "v5_sid=abc; HttpOnly; SameSite=Lax; Max-Age=360; Path=/; Secure"
        );
        settings.secure_cookie = false;
        assert!(!settings.session_cookie("abc").contains("Secure"));
    }

    #[test]
    fn wildcard_cors_origin_is_a_config_error() {
        let mut config = GatewayConfig::default();
        config.cors_origins = vec!["https://app.example.com".into(), " * ".into()];
        let err = cors_layer(&HttpSettings::from_config(&config).cors_origins).unwrap_err();
        assert!(matches!(err, RpcError::Node(NodeError::Config(_))));
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn explicit_cors_origins_build_a_layer() {
        let origins = vec!["https://app.example.com".to_string(), "bad\norigin".to_string()];
        assert!(cors_layer(&origins).is_ok());
        assert!(cors_layer(&[]).is_ok());
    }
}
