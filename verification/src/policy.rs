//! Security policy: which policy checks are fatal.

use serde::{Deserialize, Serialize};

use crate::CheckKind;

/// What the gate does when a policy check fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Reject the request.
    Enforce,
    /// Log a warning and let the request continue.
    WarnOnly,
}

/// Per-check enforcement for the four policy checks.
///
/// Existence and anti-replay are not part of the policy: they protect the
/// single-use invariant and are enforced unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub fingerprint: Enforcement,
    pub dwell_time: Enforcement,
    pub referer: Enforcement,
    pub browser_cookie: Enforcement,
}

impl SecurityPolicy {
    /// Every check enforced. The production policy.
    pub const fn strict() -> Self {
        Self {
            fingerprint: Enforcement::Enforce,
            dwell_time: Enforcement::Enforce,
            referer: Enforcement::Enforce,
            browser_cookie: Enforcement::Enforce,
        }
    }

    /// Every policy check downgraded to a warning, for local development.
    pub const fn relaxed() -> Self {
        Self {
            fingerprint: Enforcement::WarnOnly,
            dwell_time: Enforcement::WarnOnly,
            referer: Enforcement::WarnOnly,
            browser_cookie: Enforcement::WarnOnly,
        }
    }

    /// Enforcement for `check`. Existence and anti-replay always enforce.
    pub fn enforcement(&self, check: CheckKind) -> Enforcement {
        match check {
            CheckKind::Existence | CheckKind::AntiReplay => Enforcement::Enforce,
            CheckKind::Fingerprint => self.fingerprint,
            CheckKind::DwellTime => self.dwell_time,
            CheckKind::Referer => self.referer,
            CheckKind::BrowserCookie => self.browser_cookie,
        }
    }

    pub fn is_strict(&self) -> bool {
        *self == Self::strict()
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::strict()
    }
}
