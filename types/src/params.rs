//! Gate parameters: the tunable numbers behind the resolution flow.

use serde::{Deserialize, Serialize};

/// Default session lifetime: 6 minutes.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 360;

/// Default minimum time between minting a session and resolving it.
pub const DEFAULT_MIN_DWELL_SECS: u64 = 35;

/// Default name of the browser-binding cookie.
pub const DEFAULT_COOKIE_NAME: &str = "v5_sid";

/// Parameters shared by the session store, the gate, and the HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateParams {
    /// Session lifetime in seconds, measured from `created_at`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Minimum seconds a session must age before it can be resolved.
    #[serde(default = "default_min_dwell_secs")]
    pub min_dwell_secs: u64,

    /// Referer hosts allowed to hand users back to the resolve endpoint.
    /// Subdomains of an entry are accepted too.
    #[serde(default = "default_allowed_referers")]
    pub allowed_referers: Vec<String>,

    /// Name of the browser-binding cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_min_dwell_secs() -> u64 {
    DEFAULT_MIN_DWELL_SECS
}

fn default_allowed_referers() -> Vec<String> {
    vec!["linkshortify.com".to_string(), "lksfy.com".to_string()]
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            min_dwell_secs: default_min_dwell_secs(),
            allowed_referers: default_allowed_referers(),
            cookie_name: default_cookie_name(),
        }
    }
}
