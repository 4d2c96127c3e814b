//! Background sweep of expired sessions.
//!
//! Expiry is already enforced lazily on every read; the reaper only keeps
//! storage bounded.

use std::sync::Arc;
use std::time::Duration;

use linkgate_store::SessionStore;
use linkgate_types::Clock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};

use crate::metrics::GatewayMetrics;
use crate::tracing_spans::reap_span;

/// One sweep: purge expired sessions and refresh the live-session gauge.
pub fn reap_once(store: &dyn SessionStore, clock: &dyn Clock, metrics: &GatewayMetrics) -> usize {
    let purged = match store.purge_expired(clock.now()) {
        Ok(n) => n,
        Err(e) => {
            error!("session purge failed: {e}");
            0
        }
    };
    match store.session_count() {
        Ok(live) => metrics.sessions_live.set(i64::try_from(live).unwrap_or(i64::MAX)),
        Err(e) => error!("session count failed: {e}"),
    }
    if purged > 0 {
        debug!(purged, "expired sessions purged");
    }
    purged
}

/// Run [`reap_once`] every `interval` until `shutdown` fires.
pub fn spawn_reaper(
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        reap_once(store.as_ref(), clock.as_ref(), &metrics);
                    }
                    _ = shutdown.recv() => {
                        debug!("reaper stopping");
                        break;
                    }
                }
            }
        }
        .instrument(reap_span()),
    )
}

/// Wait for a reaper task to finish. A panicked or aborted task is logged,
/// not propagated. Returns whether the task exited cleanly.
pub async fn join_reaper(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            error!("session reaper task failed: {e}");
            false
        }
    }
}
