//! Short-link domain rewrite used by V3.
//!
//! V3 only accepts links of the form `http(s)://lksfy.com/<id>`. The id is
//! lifted out and re-homed on the target domain before the V2 pipeline runs.

use crate::CodecError;

/// Host whose links V3 accepts.
pub const SOURCE_HOST: &str = "lksfy.com";

const SOURCE_MARKER: &str = "://lksfy.com/";

/// Extract the short-link id from the first `http(s)://lksfy.com/<id>`
/// occurrence in `url`. The id is the run of ASCII alphanumerics after the
/// slash and must be non-empty.
pub fn extract_short_id(url: &str) -> Option<&str> {
    url.match_indices(SOURCE_MARKER).find_map(|(idx, _)| {
        let scheme = &url[..idx];
        if !(scheme.ends_with("http") || scheme.ends_with("https")) {
            return None;
        }
        let rest = &url[idx + SOURCE_MARKER.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Build the target-domain URL for a short-link id.
pub fn target_url_for(id: &str) -> String {
    format!("https://web.sharclub.in/?id={id}&plan_id=1")
}

/// Rewrite a `lksfy.com` short link into its target-domain form.
pub fn rewrite_short_link(url: &str) -> Result<String, CodecError> {
    extract_short_id(url)
        .map(target_url_for)
        .ok_or_else(|| CodecError::PatternMismatch {
            version: "v3",
            reason: format!("expected http(s)://{SOURCE_HOST}/<id>"),
        })
}
