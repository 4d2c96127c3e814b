//! Ambient request context the gate inspects.

use linkgate_types::Fingerprint;

/// What the transport layer knows about a resolve request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveContext {
    /// Client IP as derived by the HTTP layer.
    pub client: Fingerprint,
    /// Raw `Referer` header, if any.
    pub referer: Option<String>,
    /// Raw `Cookie` header, if any.
    pub cookie_header: Option<String>,
}

impl ResolveContext {
    pub fn new(client: Fingerprint) -> Self {
        Self {
            client,
            referer: None,
            cookie_header: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// Value of the cookie named `name`, if the request carries one.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_header
            .as_deref()
            .and_then(|header| cookie_value(header, name))
    }
}

/// Extract one cookie from a `Cookie` header (`a=1; b=2`).
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}
