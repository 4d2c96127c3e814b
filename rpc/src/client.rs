//! What the request tells us about the client: IP, scheme, host, referer.

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap};
use linkgate_node::RequestOrigin;
use linkgate_types::Fingerprint;
use linkgate_verification::ResolveContext;
use std::net::SocketAddr;
use tracing::debug;

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client IP: first `X-Forwarded-For` hop when trusted, else the peer address.
pub fn client_fingerprint(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> Fingerprint {
    if trust_forwarded_for {
        if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
            match Fingerprint::from_forwarded_for(forwarded) {
                Ok(fp) => return fp,
                Err(e) => debug!("ignoring X-Forwarded-For: {e}"),
            }
        }
    }
    peer.map(|ConnectInfo(addr)| Fingerprint::new(addr.ip()))
        .unwrap_or_else(Fingerprint::loopback)
}

/// Scheme and host the request arrived on.
pub fn request_origin(headers: &HeaderMap, trust_forwarded_for: bool) -> RequestOrigin {
    let scheme = forwarded_value(headers, "x-forwarded-proto", trust_forwarded_for).unwrap_or("http");
    let host = forwarded_value(headers, "x-forwarded-host", trust_forwarded_for)
        .or_else(|| header_str(headers, header::HOST))
        .unwrap_or("localhost");
    RequestOrigin::new(scheme, host)
}

/// First value of a proxy-set header, ignored unless proxies are trusted.
fn forwarded_value<'a>(headers: &'a HeaderMap, name: &str, trusted: bool) -> Option<&'a str> {
    if !trusted {
        return None;
    }
    header_str(headers, name)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
}

/// Gate context for a resolve request.
pub fn resolve_context(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> ResolveContext {
    ResolveContext {
        client: client_fingerprint(headers, peer, trust_forwarded_for),
        referer: header_str(headers, header::REFERER).map(str::to_string),
        cookie_header: header_str(headers, header::COOKIE).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn forwarded_for_wins_only_when_trusted() {
        let h = headers(&[("x-forwarded-for", "203.0.113.5, 10.0.0.1")]);
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000)));
        assert_eq!(
            client_fingerprint(&h, Some(&peer), true).to_string(),
            "203.0.113.5"
        );
        assert_eq!(client_fingerprint(&h, Some(&peer), false).to_string(), "10.0.0.1");
    }

    #[test]
    fn falls_back_to_loopback_without_peer() {
        assert_eq!(
            client_fingerprint(&HeaderMap::new(), None, true),
            Fingerprint::loopback()
        );
    }

    #[test]
    fn origin_uses_forwarded_proto_and_host() {
        let h = headers(&[("x-forwarded-proto", "https"), ("host", "gw.example.com")]);
        assert_eq!(
            request_origin(&h, true),
            RequestOrigin::new("https", "gw.example.com")
        );
        assert_eq!(
            request_origin(&h, false),
            RequestOrigin::new("http", "gw.example.com")
        );
    }
}
