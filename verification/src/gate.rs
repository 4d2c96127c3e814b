//! The verification gate: ordered checks, then the exactly-once consume.

use linkgate_store::{ConsumeOutcome, SessionStore};
use linkgate_types::{GateParams, ResolutionSession, SessionToken, Timestamp};
use tracing::{debug, info, warn};

use crate::checks;
use crate::{Enforcement, GateError, Rejection, ResolveContext, SecurityPolicy};

/// Runs the six resolve checks against a session and consumes it on success.
#[derive(Clone, Debug)]
pub struct VerificationGate {
    params: GateParams,
    policy: SecurityPolicy,
}

impl VerificationGate {
    pub fn new(params: GateParams, policy: SecurityPolicy) -> Self {
        Self { params, policy }
    }

    pub fn params(&self) -> &GateParams {
        &self.params
    }

    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    /// Evaluate every check against a session snapshot without consuming it.
    ///
    /// Returns the first enforced failure. Failures of checks downgraded to
    /// [`Enforcement::WarnOnly`] are logged and skipped.
    pub fn evaluate(
        &self,
        session: &ResolutionSession,
        ctx: &ResolveContext,
        now: Timestamp,
    ) -> Result<(), Rejection> {
        if session.is_expired(self.params.session_ttl_secs, now) {
            return Err(Rejection::ExpiredOrInvalid);
        }
        if session.consumed {
            return Err(Rejection::AlreadyUsed);
        }

        let policy_checks = [
            checks::check_fingerprint(session, ctx),
            checks::check_dwell_time(session, &self.params, now),
            checks::check_referer(ctx, &self.params),
            checks::check_browser_cookie(session, ctx, &self.params),
        ];
        for outcome in policy_checks {
            let Err(rejection) = outcome else { continue };
            match self.policy.enforcement(rejection.check()) {
                Enforcement::Enforce => return Err(rejection),
                Enforcement::WarnOnly => {
                    warn!(
                        token = %session.token,
                        check = rejection.check().as_str(),
                        "gate check failed but policy only warns: {rejection}"
                    );
                }
            }
        }
        Ok(())
    }

    /// Resolve `token`: check it, consume it, and return its target.
    ///
    /// Rejections from the policy checks leave the session untouched, so a
    /// later request that satisfies them can still succeed. Only a passing
    /// request flips the consumed flag.
    pub fn resolve(
        &self,
        store: &dyn SessionStore,
        token: &SessionToken,
        ctx: &ResolveContext,
        now: Timestamp,
    ) -> Result<String, GateError> {
        let session = match store.get(token, now) {
            Ok(session) => session,
            Err(e) if e.is_not_found() => {
                debug!(%token, "resolve for unknown or expired session");
                return Err(Rejection::ExpiredOrInvalid.into());
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(rejection) = self.evaluate(&session, ctx, now) {
            if rejection.is_policy_violation() {
                warn!(%token, client = %ctx.client, "resolve rejected: {rejection}");
            } else {
                debug!(%token, "resolve rejected: {rejection}");
            }
            return Err(rejection.into());
        }

        match store.mark_consumed(token, now)? {
            ConsumeOutcome::Consumed(consumed) => {
                info!(%token, age_secs = consumed.age(now), "session resolved");
                Ok(consumed.target_url)
            }
            ConsumeOutcome::AlreadyConsumed => {
                debug!(%token, "lost consume race");
                Err(Rejection::AlreadyUsed.into())
            }
            ConsumeOutcome::NotFound => Err(Rejection::ExpiredOrInvalid.into()),
        }
    }
}
