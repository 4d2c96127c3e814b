//! The resolution orchestrator.
//!
//! Ties the link registry, the session store, the verification gate and the
//! two external services (CAPTCHA oracle, ad shortener) into the two-phase
//! flow:
//!
//! - **generate**: slug → fresh session → resolve URL wrapped by the owner's
//!   shortener account, plus the browser-binding cookie value.
//! - **resolve**: token + request context → gate → target URL, exactly once.

use std::sync::Arc;
use std::time::Duration;

use linkgate_codec::LinkVersion;
use linkgate_store::{LinkStore, SessionStore, StoreError};
use linkgate_types::{
    Clock, Fingerprint, LinkOwner, OwnerId, SessionToken, SystemClock, Timestamp, WrappedLink,
};
use linkgate_verification::{HumanVerifier, Rejection, ResolveContext, VerificationGate};
use tracing::{debug, info, warn, Instrument};
use url::Url;

use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;
use crate::shortener::{LinkShortifyClient, Shortener};
use crate::storage::Stores;
use crate::tracing_spans::{generate_span, resolve_span};
use crate::NodeError;

/// Random bytes behind a generated slug (six hex characters).
pub const SLUG_BYTES: usize = 3;

/// Longest custom slug accepted.
pub const MAX_SLUG_LEN: usize = 64;

const SECS_PER_DAY: u64 = 86_400;

/// Attempts at finding a free random slug before giving up.
const MAX_SLUG_ATTEMPTS: usize = 8;

/// Scheme and host the generate request arrived on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }
}

/// Input to the generate phase.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    pub slug: String,
    /// CAPTCHA proof, if the client sent one.
    pub proof: Option<String>,
    pub client: Fingerprint,
    pub origin: RequestOrigin,
}

/// Result of the generate phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    /// What the user is sent to: the shortened resolve URL, or the resolve
    /// URL itself on a local deployment.
    pub outward_url: String,
    /// The gateway URL that resolves the session.
    pub resolve_url: String,
    /// Session token. Also the browser-binding cookie value.
    pub token: SessionToken,
}

/// Orchestrates generate, resolve, and the registry operations.
pub struct Resolver {
    sessions: Arc<dyn SessionStore>,
    links: Arc<dyn LinkStore>,
    gate: VerificationGate,
    verifier: Arc<dyn HumanVerifier>,
    shortener: Arc<dyn Shortener>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
    public_base_url: Option<String>,
}

impl Resolver {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        links: Arc<dyn LinkStore>,
        gate: VerificationGate,
        verifier: Arc<dyn HumanVerifier>,
        shortener: Arc<dyn Shortener>,
    ) -> Self {
        Self {
            sessions,
            links,
            gate,
            verifier,
            shortener,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(GatewayMetrics::new()),
            public_base_url: None,
        }
    }

    /// Assemble a resolver from configuration: gate parameters, policy,
    /// CAPTCHA provider, shortener endpoint and public base URL.
    pub fn from_config(config: &GatewayConfig, stores: Stores) -> Result<Self, NodeError> {
        let gate = VerificationGate::new(config.gate_params(), config.security_policy());
        let verifier = config.captcha.build_verifier()?;
        let shortener = LinkShortifyClient::with_settings(
            config.shortener.api_url.clone(),
            Duration::from_secs(config.shortener.timeout_secs.max(1)),
        );
        Ok(
            Self::new(stores.sessions, stores.links, gate, verifier, Arc::new(shortener))
                .with_public_base_url(config.public_base_url.clone()),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty());
        self
    }

    pub fn gate(&self) -> &VerificationGate {
        &self.gate
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Generate ───────────────────────────────────────────────────────

    /// Mint a session for `req.slug` and build the outward URL.
    pub async fn generate(&self, req: GenerateRequest) -> Result<Generated, NodeError> {
        let span = generate_span(&req.slug, &req.client.to_string());
        let result = self.generate_inner(req).instrument(span).await;
        match &result {
            Ok(_) => self.metrics.sessions_created.inc(),
            Err(e) => self.metrics.record_rejection(e.code()),
        }
        result
    }

    async fn generate_inner(&self, req: GenerateRequest) -> Result<Generated, NodeError> {
        if let Some(proof) = non_blank(req.proof.as_deref()) {
            self.verify_proof(proof).await?;
        }

        let now = self.clock.now();
        let link = self.links.get_link(&req.slug).map_err(|e| match e {
            e if e.is_not_found() => NodeError::LinkNotFound(req.slug.clone()),
            e => e.into(),
        })?;
        let owner = self.links.get_owner(&link.owner_id).map_err(|e| match e {
            e if e.is_not_found() => NodeError::OwnerNotFound(link.owner_id.to_string()),
            e => e.into(),
        })?;
        if !owner.is_active(now) {
            return Err(NodeError::OwnerExpired(owner.id.to_string()));
        }
        let api_key = owner
            .shortener_key()
            .ok_or_else(|| NodeError::OwnerKeyMissing(owner.id.to_string()))?
            .to_string();

        let token = self.sessions.create(&link.target_url, req.client, now)?;
        let resolve_url = format!("{}/v5/resolve/{token}", self.base_url(&req.origin));

        let outward_url = if is_local_url(&resolve_url) {
            debug!(%resolve_url, "local deployment, skipping shortener");
            resolve_url.clone()
        } else {
            self.shortener.shorten(&api_key, &resolve_url).await?
        };

        info!(%token, owner = %owner.id, "session created");
        Ok(Generated {
            outward_url,
            resolve_url,
            token,
        })
    }

    /// Public origin of the gateway: the configured base URL, or the origin
    /// the request arrived on.
    pub fn base_url(&self, origin: &RequestOrigin) -> String {
        match &self.public_base_url {
            Some(base) => base.clone(),
            None => format!("{}://{}", origin.scheme, origin.host),
        }
    }

    // ── Resolve ────────────────────────────────────────────────────────

    /// Run the gate for `raw_token` and return the target URL.
    ///
    /// A malformed token is indistinguishable from an unknown one.
    pub async fn resolve(
        &self,
        raw_token: &str,
        proof: Option<&str>,
        ctx: &ResolveContext,
    ) -> Result<String, NodeError> {
        let span = resolve_span(raw_token, &ctx.client.to_string());
        let result = self.resolve_inner(raw_token, proof, ctx).instrument(span).await;
        match &result {
            Ok(_) => self.metrics.resolutions.inc(),
            Err(e) => self.metrics.record_rejection(e.code()),
        }
        result
    }

    async fn resolve_inner(
        &self,
        raw_token: &str,
        proof: Option<&str>,
        ctx: &ResolveContext,
    ) -> Result<String, NodeError> {
        let token = SessionToken::parse(raw_token)
            .map_err(|_| NodeError::Rejected(Rejection::ExpiredOrInvalid))?;

        if let Some(proof) = non_blank(proof) {
            self.verify_proof(proof).await?;
        }

        let now = self.clock.now();
        Ok(self.gate.resolve(self.sessions.as_ref(), &token, ctx, now)?)
    }

    async fn verify_proof(&self, proof: &str) -> Result<(), NodeError> {
        match self.verifier.verify(proof).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(provider = self.verifier.name(), "proof rejected");
                Err(NodeError::CaptchaFailed)
            }
            Err(e) => {
                warn!(provider = self.verifier.name(), "oracle error: {e}");
                Err(NodeError::CaptchaFailed)
            }
        }
    }

    // ── Registry ───────────────────────────────────────────────────────

    /// Whether `slug` is registered. Never reveals the target.
    pub fn link_exists(&self, slug: &str) -> Result<(), NodeError> {
        if self.links.link_exists(slug)? {
            Ok(())
        } else {
            Err(NodeError::LinkNotFound(slug.to_string()))
        }
    }

    /// Create or renew an owner, valid for `valid_days` from now.
    pub fn register_owner(
        &self,
        id: OwnerId,
        valid_days: u64,
        shortener_key: Option<String>,
    ) -> Result<LinkOwner, NodeError> {
        let owner = LinkOwner {
            id,
            valid_until: self
                .clock
                .now()
                .plus_secs(valid_days.saturating_mul(SECS_PER_DAY)),
            shortener_key,
        };
        self.links.put_owner(&owner)?;
        info!(owner = %owner.id, valid_until = %owner.valid_until, "owner registered");
        Ok(owner)
    }

    /// Register a wrapped link for an active owner.
    ///
    /// Uses `custom_slug` when given, otherwise picks a random free slug.
    pub fn register_link(
        &self,
        owner_id: &OwnerId,
        target_url: &str,
        custom_slug: Option<&str>,
    ) -> Result<WrappedLink, NodeError> {
        let now = self.clock.now();
        let owner = self.links.get_owner(owner_id).map_err(|e| match e {
            e if e.is_not_found() => NodeError::OwnerNotFound(owner_id.to_string()),
            e => e.into(),
        })?;
        if !owner.is_active(now) {
            return Err(NodeError::OwnerExpired(owner.id.to_string()));
        }
        let target_url = validate_target(target_url)?;

        let slug = match non_blank(custom_slug) {
            Some(slug) => {
                validate_slug(slug)?;
                if self.links.link_exists(slug)? {
                    return Err(NodeError::SlugTaken(slug.to_string()));
                }
                slug.to_string()
            }
            None => self.free_random_slug()?,
        };

        let link = WrappedLink {
            slug,
            target_url,
            owner_id: owner.id,
            created_at: now,
        };
        self.links.put_link(&link).map_err(|e| match e {
            StoreError::Duplicate(_) => NodeError::SlugTaken(link.slug.clone()),
            e => e.into(),
        })?;
        info!(slug = %link.slug, owner = %link.owner_id, "link registered");
        Ok(link)
    }

    fn free_random_slug(&self) -> Result<String, NodeError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = random_slug()?;
            if !self.links.link_exists(&slug)? {
                return Ok(slug);
            }
        }
        Err(NodeError::SlugTaken("no free random slug".into()))
    }

    // ── Codec ──────────────────────────────────────────────────────────

    /// Encode a URL into a V4 slug. Requires a passing proof.
    pub async fn encode_link(&self, url: &str, proof: Option<&str>) -> Result<String, NodeError> {
        self.require_proof(proof).await?;
        let url = url.trim();
        if url.is_empty() {
            return Err(NodeError::BadRequest("url is required".into()));
        }
        let lower = url.to_ascii_lowercase();
        let url = if lower.starts_with("http://") || lower.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };
        LinkVersion::V4.encode(&url).map_err(|e| {
            debug!("encode failed: {e}");
            NodeError::InvalidLink
        })
    }

    /// Decode a V4 slug back into its URL. Requires a passing proof.
    pub async fn decode_link(&self, slug: &str, proof: Option<&str>) -> Result<String, NodeError> {
        self.require_proof(proof).await?;
        match LinkVersion::V4.decode(slug.trim()) {
            Ok(url) if !url.is_empty() => Ok(url),
            Ok(_) => Err(NodeError::InvalidLink),
            Err(e) => {
                debug!("decode failed: {e}");
                Err(NodeError::InvalidLink)
            }
        }
    }

    async fn require_proof(&self, proof: Option<&str>) -> Result<(), NodeError> {
        match non_blank(proof) {
            Some(proof) => self.verify_proof(proof).await,
            None => Err(NodeError::CaptchaFailed),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Whether the URL points at this machine, where no shortener can reach it.
fn is_local_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "localhost" || host == "127.0.0.1")
}

fn validate_target(raw: &str) -> Result<String, NodeError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| NodeError::BadRequest(format!("invalid target url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(NodeError::BadRequest(format!(
            "unsupported target scheme: {other}"
        ))),
    }
}

fn validate_slug(slug: &str) -> Result<(), NodeError> {
    let ok = slug.len() <= MAX_SLUG_LEN
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(NodeError::BadRequest(format!(
            "slug must be 1-{MAX_SLUG_LEN} characters of [A-Za-z0-9_-]"
        )))
    }
}

fn random_slug() -> Result<String, NodeError> {
    let mut bytes = [0u8; SLUG_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| NodeError::Store(StoreError::Backend(format!("entropy: {e}"))))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_detection() {
        assert!(is_local_url("http://localhost:8080/v5/resolve/x"));
        assert!(is_local_url("http://127.0.0.1/v5/resolve/x"));
        assert!(!is_local_url("https://gw.example.com/v5/resolve/x"));
        assert!(!is_local_url("https://localhost.evil.com/"));
    }

    #[test]
    fn slugs_are_restricted() {
        assert!(validate_slug("promo_2026-a").is_ok());
        assert!(validate_slug("no spaces").is_err());
        assert!(validate_slug("../etc").is_err());
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LEN + 1)).is_err());
    }

    #[test]
    fn random_slug_is_six_hex_chars() {
        let slug = random_slug().unwrap();
        assert_eq!(slug.len(), SLUG_BYTES * 2);
        assert!(slug.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn targets_must_be_http() {
        assert!(validate_target("https://files.example/a.zip").is_ok());
        assert!(validate_target("javascript:alert(1)").is_err());
        assert!(validate_target("not a url").is_err());
    }
}
