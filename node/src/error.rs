use linkgate_verification::Rejection;
use thiserror::Error;

use crate::ShortenerError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("link not found: {0}")]
    LinkNotFound(String),

    #[error("owner not found: {0}")]
    OwnerNotFound(String),

    #[error("owner subscription expired: {0}")]
    OwnerExpired(String),

    #[error("owner has no shortener key: {0}")]
    OwnerKeyMissing(String),

    #[error("slug already taken: {0}")]
    SlugTaken(String),

    #[error("human verification failed")]
    CaptchaFailed,

    #[error("invalid link")]
    InvalidLink,

    #[error("gate rejected request: {0}")]
    Rejected(Rejection),

    #[error("shortener error: {0}")]
    Shortener(#[from] ShortenerError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] linkgate_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] linkgate_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),
}

impl NodeError {
    /// Machine-readable code returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LinkNotFound(_) => "LINK_NOT_FOUND",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
            Self::OwnerExpired(_) => "OWNER_EXPIRED",
            Self::OwnerKeyMissing(_) => "OWNER_KEY_MISSING",
            Self::SlugTaken(_) => "SLUG_TAKEN",
            Self::CaptchaFailed => "CAPTCHA_FAILED",
            Self::InvalidLink => "INVALID_LINK",
            Self::Rejected(r) => r.code(),
            Self::Shortener(ShortenerError::Timeout(_)) => "SHORTENER_TIMEOUT",
            Self::Shortener(_) => "SHORTENER_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Store(_) | Self::Lmdb(_) | Self::Config(_) => "INTERNAL",
        }
    }

    /// Message safe to show the end user. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::LinkNotFound(_) => "Link not found".into(),
            Self::OwnerNotFound(_) => "Link owner not found".into(),
            Self::OwnerExpired(_) => "This link's owner subscription has expired".into(),
            Self::OwnerKeyMissing(_) => "Link owner has not configured a shortener".into(),
            Self::SlugTaken(slug) => format!("Slug '{slug}' is already taken"),
            Self::CaptchaFailed => "Human verification failed".into(),
            Self::InvalidLink => "Invalid link".into(),
            Self::Rejected(r) => r.user_message().into(),
            Self::Shortener(ShortenerError::Timeout(_)) => "Shortener service timed out".into(),
            Self::Shortener(_) => "Shortener service failed".into(),
            Self::BadRequest(msg) => msg.clone(),
            _ => "Internal server error".into(),
        }
    }
}

impl From<linkgate_verification::GateError> for NodeError {
    fn from(e: linkgate_verification::GateError) -> Self {
        match e {
            linkgate_verification::GateError::Rejected(r) => NodeError::Rejected(r),
            linkgate_verification::GateError::Store(s) => NodeError::Store(s),
        }
    }
}
