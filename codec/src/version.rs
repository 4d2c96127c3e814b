//! The codec registry: version tags and their encode/decode pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::rewrite::rewrite_short_link;
use crate::rot13::rotate13;
use crate::scramble::{scramble, unscramble};
use crate::xor::{xor_stream, XOR_KEY};
use crate::{base64url, CodecError};

/// Identifies one of the reversible link encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkVersion {
    /// Plain base64url.
    V0,
    /// ROT13, then base64url.
    V1,
    /// Repeating-key XOR, then base64url.
    V2,
    /// `lksfy.com` rewrite, then V2.
    V3,
    /// Length-keyed Caesar, reverse, block shuffle, then base64url.
    V4,
}

impl LinkVersion {
    pub const ALL: [LinkVersion; 5] = [Self::V0, Self::V1, Self::V2, Self::V3, Self::V4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0 => "v0",
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
            Self::V4 => "v4",
        }
    }

    /// Encode `url` into a slug.
    pub fn encode(&self, url: &str) -> Result<String, CodecError> {
        let bytes = url.as_bytes();
        let slug = match self {
            Self::V0 => base64url::encode(bytes),
            Self::V1 => base64url::encode(&rotate13(bytes)),
            Self::V2 => base64url::encode(&xor_stream(bytes, XOR_KEY)),
            Self::V3 => {
                let rewritten = rewrite_short_link(url)?;
                base64url::encode(&xor_stream(rewritten.as_bytes(), XOR_KEY))
            }
            Self::V4 => base64url::encode(&scramble(bytes)),
        };
        Ok(slug)
    }

    /// Decode a slug back into the URL it was produced from.
    ///
    /// V3 decodes to the rewritten target-domain URL, not the original short
    /// link: the rewrite is one-way by construction.
    pub fn decode(&self, slug: &str) -> Result<String, CodecError> {
        let raw = base64url::decode(slug)?;
        let bytes = match self {
            Self::V0 => raw,
            Self::V1 => rotate13(&raw),
            Self::V2 | Self::V3 => xor_stream(&raw, XOR_KEY),
            Self::V4 => unscramble(&raw),
        };
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl fmt::Display for LinkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkVersion {
    type Err = CodecError;

    /// Accepts `v0`..`v4` (any case) or the bare digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        match digits {
            "0" => Ok(Self::V0),
            "1" => Ok(Self::V1),
            "2" => Ok(Self::V2),
            "3" => Ok(Self::V3),
            "4" => Ok(Self::V4),
            _ => Err(CodecError::UnknownVersion(s.to_string())),
        }
    }
}

/// Encode, logging any failure and returning the empty string instead.
///
/// Callers treat an empty slug as "invalid link".
pub fn encode_or_empty(version: LinkVersion, url: &str) -> String {
    version.encode(url).unwrap_or_else(|e| {
        warn!(%version, error = %e, "link encode failed");
        String::new()
    })
}

/// Decode, logging any failure and returning the empty string instead.
pub fn decode_or_empty(version: LinkVersion, slug: &str) -> String {
    version.decode(slug).unwrap_or_else(|e| {
        warn!(%version, error = %e, "link decode failed");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com";

    #[test]
    fn v0_matches_plain_base64url() {
        assert_eq!(LinkVersion::V0.encode(URL).unwrap(), "aHR0cHM6Ly9leGFtcGxlLmNvbQ");
    }

    #[test]
    fn v2_round_trips_the_reference_url() {
        let slug = LinkVersion::V2.encode(URL).unwrap();
        assert_ne!(slug, LinkVersion::V0.encode(URL).unwrap());
        assert_eq!(LinkVersion::V2.decode(&slug).unwrap(), URL);
    }

    #[test]
    fn every_general_version_round_trips() {
        let url = "https://example.com/path/to?x=1&y=Zebra#frag";
        for version in [LinkVersion::V0, LinkVersion::V1, LinkVersion::V2, LinkVersion::V4] {
            let slug = version.encode(url).unwrap();
            assert_eq!(version.decode(&slug).unwrap(), url, "{version}");
        }
    }

    #[test]
    fn non_ascii_round_trips_for_byte_level_versions() {
        let url = "https://example.com/caf\u{e9}/\u{1f600}";
        for version in [LinkVersion::V0, LinkVersion::V1, LinkVersion::V2, LinkVersion::V4] {
            let slug = version.encode(url).unwrap();
            assert_eq!(version.decode(&slug).unwrap(), url, "{version}");
        }
    }

    #[test]
    fn v3_rejects_non_matching_input_with_empty_sentinel() {
        assert!(matches!(
            LinkVersion::V3.encode(URL),
            Err(CodecError::PatternMismatch { .. })
        ));
        assert_eq!(encode_or_empty(LinkVersion::V3, URL), "");
    }

    #[test]
    fn v3_decodes_to_the_rewritten_url() {
        let slug = LinkVersion::V3.encode("https://lksfy.com/QDuafv").unwrap();
        assert_eq!(
            LinkVersion::V3.decode(&slug).unwrap(),
            "https://web.sharclub.in/?id=QDuafv&plan_id=1"
        );
    }

    #[test]
    fn slugs_are_url_path_safe() {
        let url = "https://example.com/?a=~~~~&b=>>>>";
        for version in [LinkVersion::V0, LinkVersion::V1, LinkVersion::V2, LinkVersion::V4] {
            let slug = version.encode(url).unwrap();
            assert!(
                slug.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
                "{version}: {slug}"
            );
        }
    }

    #[test]
    fn corrupted_slug_never_panics() {
        for version in LinkVersion::ALL {
            let slug = match version {
                LinkVersion::V3 => version.encode("https://lksfy.com/QDuafv").unwrap(),
                _ => version.encode(URL).unwrap(),
            };
            for idx in 0..slug.len() {
                let mut corrupted = slug.clone().into_bytes();
                corrupted[idx] = if corrupted[idx] == b'A' { b'*' } else { b'A' };
                let corrupted = String::from_utf8(corrupted).unwrap();
                // Either garbled output or the empty sentinel; never a panic.
                let _ = decode_or_empty(version, &corrupted);
            }
        }
    }

    #[test]
    fn truncated_slug_yields_empty_sentinel() {
        let slug = LinkVersion::V4.encode(URL).unwrap();
        let truncated = format!("{}x", &slug[..slug.len() - slug.len() % 4]);
        assert_eq!(decode_or_empty(LinkVersion::V4, &truncated), "");
    }

    #[test]
    fn version_parsing() {
        assert_eq!("v4".parse::<LinkVersion>().unwrap(), LinkVersion::V4);
        assert_eq!("V1".parse::<LinkVersion>().unwrap(), LinkVersion::V1);
        assert_eq!("2".parse::<LinkVersion>().unwrap(), LinkVersion::V2);
        assert!("v5".parse::<LinkVersion>().is_err());
        assert_eq!(LinkVersion::V3.to_string(), "v3");
    }
}
