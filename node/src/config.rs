//! Gateway configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use linkgate_types::params::{
    DEFAULT_COOKIE_NAME, DEFAULT_MIN_DWELL_SECS, DEFAULT_SESSION_TTL_SECS,
};
use linkgate_types::GateParams;
use linkgate_utils::LogFormat;
use linkgate_verification::{
    CustomCaptchaVerifier, DisabledVerifier, HumanVerifier, RecaptchaVerifier, SecurityPolicy,
};

use crate::NodeError;

/// Where sessions, links and owners are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory. Everything is lost on restart.
    Memory,
    /// LMDB environment under `data_dir`.
    Lmdb,
}

/// Named security policy, as written in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    Strict,
    Relaxed,
}

impl PolicyName {
    /// Parse a policy name as given on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "relaxed" => Some(Self::Relaxed),
            _ => None,
        }
    }

    pub fn policy(&self) -> SecurityPolicy {
        match self {
            Self::Strict => SecurityPolicy::strict(),
            Self::Relaxed => SecurityPolicy::relaxed(),
        }
    }
}

/// Which human-verification oracle checks CAPTCHA proofs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaProvider {
    Recaptcha,
    Custom,
    Disabled,
}

/// Configuration for a linkgate gateway.
///
/// Can be loaded from a TOML file via [`GatewayConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public origin used to build resolve URLs (e.g. `https://go.example.com`).
    /// When unset, the request's own scheme and host are used.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Data directory for the LMDB backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics at `/metrics`.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Take the client IP from the first `X-Forwarded-For` hop.
    /// Only safe behind a proxy that sets the header.
    #[serde(default = "default_true")]
    pub trust_forwarded_for: bool,

    /// Substrings that, found in `Referer` or `Origin`, get a request refused.
    #[serde(default = "default_blocked_origins")]
    pub blocked_origins: Vec<String>,

    /// Browser origins allowed to call the API cross-origin (with cookies).
    /// Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Seconds between expired-session sweeps.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub captcha: CaptchaConfig,

    #[serde(default)]
    pub shortener: ShortenerConfig,
}

/// `[gate]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_min_dwell_secs")]
    pub min_dwell_secs: u64,

    /// Hosts (and their subdomains) a resolve request may come from.
    /// Add the gateway's own host to resolve via `POST /api/v5/resolve`
    /// from a gateway page.
    #[serde(default = "default_allowed_referers")]
    pub allowed_referers: Vec<String>,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_policy")]
    pub policy: PolicyName,
}

/// `[captcha]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_captcha_provider")]
    pub provider: CaptchaProvider,

    /// reCAPTCHA server secret.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Verification endpoint. Required for `custom`; overrides Google's URL
    /// for `recaptcha`.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_captcha_timeout_secs")]
    pub timeout_secs: u64,
}

/// `[shortener]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShortenerConfig {
    #[serde(default = "default_shortener_api_url")]
    pub api_url: String,

    #[serde(default = "default_shortener_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./linkgate_data")
}

fn default_storage() -> StorageBackend {
    StorageBackend::Memory
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_blocked_origins() -> Vec<String> {
    vec!["railway.app".to_string()]
}

fn default_reap_interval_secs() -> u64 {
    30
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_min_dwell_secs() -> u64 {
    DEFAULT_MIN_DWELL_SECS
}

fn default_allowed_referers() -> Vec<String> {
    GateParams::default().allowed_referers
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_policy() -> PolicyName {
    PolicyName::Strict
}

fn default_captcha_provider() -> CaptchaProvider {
    CaptchaProvider::Recaptcha
}

fn default_min_score() -> f64 {
    linkgate_verification::oracle::DEFAULT_MIN_SCORE
}

fn default_captcha_timeout_secs() -> u64 {
    5
}

fn default_shortener_api_url() -> String {
    crate::shortener::LINKSHORTIFY_API_URL.to_string()
}

fn default_shortener_timeout_secs() -> u64 {
    8
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be served.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.cors_origins.iter().any(|o| o.trim() == "*") {
            return Err(NodeError::Config(
                "cors_origins may not contain \"*\" because the session cookie is credentialed"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("GatewayConfig is always serializable to TOML")
    }

    /// Gate parameters derived from the `[gate]` section.
    pub fn gate_params(&self) -> GateParams {
        GateParams {
            session_ttl_secs: self.gate.session_ttl_secs,
            min_dwell_secs: self.gate.min_dwell_secs,
            allowed_referers: self.gate.allowed_referers.clone(),
            cookie_name: self.gate.cookie_name.clone(),
        }
    }

    pub fn security_policy(&self) -> SecurityPolicy {
        self.gate.policy.policy()
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }
}

impl CaptchaConfig {
    /// Build the configured oracle.
    pub fn build_verifier(&self) -> Result<Arc<dyn HumanVerifier>, NodeError> {
        let timeout = Duration::from_secs(self.timeout_secs.max(1));
        match self.provider {
            CaptchaProvider::Recaptcha => {
                let secret = self
                    .secret_key
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        NodeError::Config("captcha.secret_key is required for recaptcha".into())
                    })?;
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| linkgate_verification::oracle::RECAPTCHA_VERIFY_URL.into());
                Ok(Arc::new(RecaptchaVerifier::with_settings(
                    secret,
                    endpoint,
                    self.min_score,
                    timeout,
                )))
            }
            CaptchaProvider::Custom => {
                let endpoint = self.endpoint.clone().ok_or_else(|| {
                    NodeError::Config("captcha.endpoint is required for custom".into())
                })?;
                Ok(Arc::new(CustomCaptchaVerifier::new(endpoint, timeout)))
            }
            CaptchaProvider::Disabled => Ok(Arc::new(DisabledVerifier)),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            public_base_url: None,
            data_dir: default_data_dir(),
            storage: default_storage(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: default_true(),
            trust_forwarded_for: default_true(),
            blocked_origins: default_blocked_origins(),
            cors_origins: Vec::new(),
            reap_interval_secs: default_reap_interval_secs(),
            gate: GateConfig::default(),
            captcha: CaptchaConfig::default(),
            shortener: ShortenerConfig::default(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            min_dwell_secs: default_min_dwell_secs(),
            allowed_referers: default_allowed_referers(),
            cookie_name: default_cookie_name(),
            policy: default_policy(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            provider: default_captcha_provider(),
            secret_key: None,
            endpoint: None,
            min_score: default_min_score(),
            timeout_secs: default_captcha_timeout_secs(),
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            api_url: default_shortener_api_url(),
            timeout_secs: default_shortener_timeout_secs(),
        }
    }
}
