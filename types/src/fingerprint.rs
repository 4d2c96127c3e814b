//! Client fingerprint captured when a session is minted.

use crate::LinkgateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// The client IP address a session is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(IpAddr);

impl Fingerprint {
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// Loopback fallback used when the transport gives no address at all.
    pub fn loopback() -> Self {
        Self(IpAddr::from([127, 0, 0, 1]))
    }

    /// Parse the first hop of an `X-Forwarded-For` header value.
    pub fn from_forwarded_for(header: &str) -> Result<Self, LinkgateError> {
        let first = header.split(',').next().unwrap_or_default().trim();
        first
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| LinkgateError::InvalidFingerprint(first.to_string()))
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for Fingerprint {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
