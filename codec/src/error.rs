use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed slug: {0}")]
    MalformedSlug(String),

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("input does not match the {version} pattern: {reason}")]
    PatternMismatch {
        version: &'static str,
        reason: String,
    },

    #[error("unknown link version: {0}")]
    UnknownVersion(String),
}
