//! Prometheus metrics for the handler chains and the probe engine.
//!
//! - `irc_dispatch_total{command,outcome}` - messages run through the chains
//! - `irc_handler_faults_total{handler,error}` - isolated handler failures
//! - `irc_version_probes_total` - VERSION probes sent
//! - `irc_version_results_total{outcome}` - how probes settled
//! - `irc_stale_timers_total` - probe timeouts that arrived too late to matter
//!
//! Recording before [`init`] is a no-op, so library users who do not scrape
//! metrics pay nothing.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Messages dispatched, by command and whether a handler consumed them.
pub static DISPATCH_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler faults by handler name and error kind.
pub static HANDLER_FAULTS: OnceLock<IntCounterVec> = OnceLock::new();

/// VERSION probes sent.
pub static PROBES_ISSUED: OnceLock<IntCounter> = OnceLock::new();

/// Settled probes by outcome (`version`, `error_reply`, `timeout`, `malformed`).
pub static PROBE_RESULTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Probe timer expirations ignored as stale.
pub static STALE_TIMERS: OnceLock<IntCounter> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(DISPATCH_COUNTER, IntCounterVec::new(Opts::new("irc_dispatch_total", "Messages run through the handler chains"), &["command", "outcome"]));
    register!(HANDLER_FAULTS, IntCounterVec::new(Opts::new("irc_handler_faults_total", "Isolated handler failures"), &["handler", "error"]));
    register!(PROBES_ISSUED, IntCounter::new("irc_version_probes_total", "CTCP VERSION probes sent"));
    register!(PROBE_RESULTS, IntCounterVec::new(Opts::new("irc_version_results_total", "Settled VERSION probes by outcome"), &["outcome"]));
    register!(STALE_TIMERS, IntCounter::new("irc_stale_timers_total", "Probe timeouts ignored as stale"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record one dispatched message.
#[inline]
pub fn record_dispatch(command: &str, handled: bool) {
    if let Some(c) = DISPATCH_COUNTER.get() {
        let outcome = if handled { "handled" } else { "default" };
        c.with_label_values(&[command, outcome]).inc();
    }
}

/// Record a handler fault.
#[inline]
pub fn record_handler_fault(handler: &str, error: &str) {
    if let Some(c) = HANDLER_FAULTS.get() {
        c.with_label_values(&[handler, error]).inc();
    }
}

#[inline]
pub fn record_probe_issued() {
    if let Some(c) = PROBES_ISSUED.get() {
        c.inc();
    }
}

/// Record how a probe settled.
#[inline]
pub fn record_probe_result(outcome: &str) {
    if let Some(c) = PROBE_RESULTS.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_stale_timer() {
    if let Some(c) = STALE_TIMERS.get() {
        c.inc();
    }
}
