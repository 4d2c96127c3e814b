//! Prometheus metrics for the gateway.
//!
//! [`GatewayMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Central collection of all gateway-level Prometheus metrics.
pub struct GatewayMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Sessions minted by the generate phase.
    pub sessions_created: IntCounter,
    /// Sessions consumed by a passing resolve.
    pub resolutions: IntCounter,
    /// Failed generate or resolve requests, labelled by error code.
    pub rejections: IntCounterVec,
    /// Sessions currently held by the store, expired or not.
    pub sessions_live: IntGauge,
}

impl GatewayMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let sessions_created = register_int_counter_with_registry!(
            Opts::new(
                "linkgate_sessions_created_total",
                "Total resolution sessions created"
            ),
            registry
        )
        .expect("failed to register sessions_created counter");

        let resolutions = register_int_counter_with_registry!(
            Opts::new(
                "linkgate_resolutions_total",
                "Total sessions resolved to their target"
            ),
            registry
        )
        .expect("failed to register resolutions counter");

        let rejections = register_int_counter_vec_with_registry!(
            Opts::new(
                "linkgate_rejections_total",
                "Total rejected requests by error code"
            ),
            &["code"],
            registry
        )
        .expect("failed to register rejections counter");

        let sessions_live = register_int_gauge_with_registry!(
            Opts::new("linkgate_sessions_live", "Sessions currently stored"),
            registry
        )
        .expect("failed to register sessions_live gauge");

        Self {
            registry,
            sessions_created,
            resolutions,
            rejections,
            sessions_live,
        }
    }

    pub fn record_rejection(&self, code: &str) {
        self.rejections.with_label_values(&[code]).inc();
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        let metrics = GatewayMetrics::new();
        metrics.sessions_created.inc();
        metrics.record_rejection("TOO_FAST");
        metrics.record_rejection("TOO_FAST");

        let text = metrics.encode().unwrap();
        assert!(text.contains("linkgate_sessions_created_total 1"));
        assert!(text.contains("linkgate_rejections_total{code=\"TOO_FAST\"} 2"));
    }
}
