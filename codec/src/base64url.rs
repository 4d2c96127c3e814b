//! The base64url framing shared by every version.
//!
//! Encoding emits the URL-safe alphabet (`-` and `_` instead of `+` and `/`)
//! with trailing `=` stripped. Decoding reconstructs the padding by
//! right-padding with `=` to a multiple of four characters.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::CodecError;

/// Encode raw bytes as an unpadded base64url slug.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a slug produced by [`encode`].
///
/// Slugs written with the standard alphabet (`+`, `/`) or with their padding
/// still attached are accepted too.
pub fn decode(slug: &str) -> Result<Vec<u8>, CodecError> {
    let mut padded: String = slug
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| CodecError::MalformedSlug(e.to_string()))
}
