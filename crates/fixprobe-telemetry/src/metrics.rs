//! Prometheus metrics for fixprobe.
//!
//! Covers:
//! - Inbound messages by type
//! - Outbound requests by kind and send outcome
//! - Rejects by source (session / business)
//! - Current workflow phase
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash at
//! first use rather than silently drop observations.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, Encoder, IntCounterVec, IntGaugeVec,
    TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Total inbound messages.
/// Labels: msg_type (raw MsgType value, e.g. "8", "0", "3")
pub static INBOUND_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fixprobe_inbound_messages_total",
        "Total messages received from the gateway",
        &["msg_type"]
    )
    .unwrap()
});

/// Total outbound requests.
/// Labels: kind (new_order/cancel/status/invalid_create/invalid_cancel),
/// outcome (sent/not_sent/session_not_found/not_logged_on/build_failed/queue_full)
pub static OUTBOUND_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fixprobe_outbound_requests_total",
        "Total outbound order-entry requests by outcome",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Total rejects received.
/// Labels: source (session/business)
pub static REJECTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fixprobe_rejects_total",
        "Total reject messages received",
        &["source"]
    )
    .unwrap()
});

/// Workflow phase (1 = active, 0 = inactive).
pub static WORKFLOW_PHASE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "fixprobe_workflow_phase",
        "Workflow phase (1=active, 0=inactive)",
        &["phase"]
    )
    .unwrap()
});

/// Phase labels known to the gauge. Must match `WorkflowPhase::as_str`.
pub const PHASE_LABELS: &[&str] = &[
    "disconnected",
    "handshake_pending",
    "awaiting_create_ack",
    "awaiting_status_ack",
    "awaiting_cancel_ack",
    "awaiting_invalid_create_reject",
    "awaiting_invalid_cancel_reject",
    "terminated",
];

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record an inbound message.
    pub fn inbound_message(msg_type: &str) {
        INBOUND_MESSAGES_TOTAL.with_label_values(&[msg_type]).inc();
    }

    /// Record the outcome of an outbound request.
    pub fn outbound_request(kind: &str, outcome: &str) {
        OUTBOUND_REQUESTS_TOTAL
            .with_label_values(&[kind, outcome])
            .inc();
    }

    /// Record a reject. `source` is "session" or "business".
    pub fn reject_received(source: &str) {
        REJECTS_TOTAL.with_label_values(&[source]).inc();
    }

    /// Set the active workflow phase. All other phases drop to 0.
    pub fn workflow_phase_set(phase: &str) {
        for p in PHASE_LABELS {
            WORKFLOW_PHASE.with_label_values(&[p]).set(0);
        }
        WORKFLOW_PHASE.with_label_values(&[phase]).set(1);
    }

    /// Render the default registry in the Prometheus text format.
    pub fn snapshot() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
