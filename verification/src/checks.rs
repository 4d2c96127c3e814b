//! The individual gate checks.
//!
//! Each check is a pure function of the session snapshot, the request
//! context, and the current time. Ordering and enforcement live in
//! [`crate::VerificationGate`].

use linkgate_types::{GateParams, ResolutionSession, Timestamp};
use url::Url;

use crate::{ResolveContext, Rejection};

/// Check 3: the request comes from the IP that minted the session.
pub fn check_fingerprint(
    session: &ResolutionSession,
    ctx: &ResolveContext,
) -> Result<(), Rejection> {
    if session.fingerprint == ctx.client {
        Ok(())
    } else {
        Err(Rejection::FingerprintMismatch {
            expected: session.fingerprint,
            actual: ctx.client,
        })
    }
}

/// Check 4: the session has aged at least `min_dwell_secs`.
pub fn check_dwell_time(
    session: &ResolutionSession,
    params: &GateParams,
    now: Timestamp,
) -> Result<(), Rejection> {
    let elapsed = session.age(now);
    if elapsed >= params.min_dwell_secs {
        Ok(())
    } else {
        Err(Rejection::TooFast {
            elapsed_secs: elapsed,
            required_secs: params.min_dwell_secs,
        })
    }
}

/// Check 5: the referer host is an allow-listed domain or a subdomain of one.
pub fn check_referer(ctx: &ResolveContext, params: &GateParams) -> Result<(), Rejection> {
    let allowed = ctx
        .referer
        .as_deref()
        .and_then(referer_host)
        .is_some_and(|host| {
            params
                .allowed_referers
                .iter()
                .any(|domain| host_matches(&host, domain))
        });
    if allowed {
        Ok(())
    } else {
        Err(Rejection::InvalidReferer {
            referer: ctx.referer.clone(),
        })
    }
}

/// Check 6: the browser presents the cookie set when the session was minted.
pub fn check_browser_cookie(
    session: &ResolutionSession,
    ctx: &ResolveContext,
    params: &GateParams,
) -> Result<(), Rejection> {
    match ctx.cookie(&params.cookie_name) {
        Some(value) if value == session.token.as_str() => Ok(()),
        _ => Err(Rejection::BrowserMismatch),
    }
}

fn referer_host(referer: &str) -> Option<String> {
    let url = Url::parse(referer.trim()).ok()?;
    url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

/// `host` equals `domain` or ends with `.domain`.
///
/// A plain suffix test would accept `evillinkshortify.com`.
fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}
