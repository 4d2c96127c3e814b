//! Why a resolve request was refused.

use linkgate_types::Fingerprint;
use std::fmt;

/// Identifies one of the gate's checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Existence,
    AntiReplay,
    Fingerprint,
    DwellTime,
    Referer,
    BrowserCookie,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existence => "existence",
            Self::AntiReplay => "anti_replay",
            Self::Fingerprint => "fingerprint",
            Self::DwellTime => "dwell_time",
            Self::Referer => "referer",
            Self::BrowserCookie => "browser_cookie",
        }
    }
}

/// The first failing check of a resolve attempt, with diagnostic context.
///
/// The diagnostic fields are for server-side logs only. Clients get
/// [`Rejection::code`] and [`Rejection::user_message`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    ExpiredOrInvalid,
    AlreadyUsed,
    FingerprintMismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },
    TooFast {
        elapsed_secs: u64,
        required_secs: u64,
    },
    InvalidReferer {
        referer: Option<String>,
    },
    BrowserMismatch,
}

impl Rejection {
    /// Machine-readable code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExpiredOrInvalid => "EXPIRED_OR_INVALID",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::FingerprintMismatch { .. } => "FINGERPRINT_MISMATCH",
            Self::TooFast { .. } => "TOO_FAST",
            Self::InvalidReferer { .. } => "INVALID_REFERER",
            Self::BrowserMismatch => "BROWSER_MISMATCH",
        }
    }

    pub fn check(&self) -> CheckKind {
        match self {
            Self::ExpiredOrInvalid => CheckKind::Existence,
            Self::AlreadyUsed => CheckKind::AntiReplay,
            Self::FingerprintMismatch { .. } => CheckKind::Fingerprint,
            Self::TooFast { .. } => CheckKind::DwellTime,
            Self::InvalidReferer { .. } => CheckKind::Referer,
            Self::BrowserMismatch => CheckKind::BrowserCookie,
        }
    }

    /// Whether this is a policy violation (checks 3–6) rather than a session
    /// state error.
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, Self::ExpiredOrInvalid | Self::AlreadyUsed)
    }

    /// Message safe to show the end user.
    ///
    /// Policy violations share one message so the response does not reveal
    /// which check was bypassed.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ExpiredOrInvalid => "Link expired or invalid",
            Self::AlreadyUsed => "Link already used",
            _ => "Verification failed. Please start again from the original link.",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FingerprintMismatch { expected, actual } => {
                write!(f, "{} (expected {expected}, got {actual})", self.code())
            }
            Self::TooFast {
                elapsed_secs,
                required_secs,
            } => write!(
                f,
                "{} ({elapsed_secs}s elapsed, {required_secs}s required)",
                self.code()
            ),
            Self::InvalidReferer { referer } => write!(
                f,
                "{} (referer {})",
                self.code(),
                referer.as_deref().unwrap_or("<none>")
            ),
            _ => f.write_str(self.code()),
        }
    }
}
