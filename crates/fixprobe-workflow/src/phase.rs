//! Workflow phases.

use std::fmt;

/// Where the scripted lifecycle currently stands for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowPhase {
    #[default]
    Disconnected,
    /// Logon signed and sent, waiting for the counterparty.
    HandshakePending,
    AwaitingCreateAck,
    AwaitingStatusAck,
    AwaitingCancelAck,
    AwaitingInvalidCreateReject,
    AwaitingInvalidCancelReject,
    /// Both probes attempted. Absorbing.
    Terminated,
}

impl WorkflowPhase {
    /// Metric label. Kept in sync with `fixprobe_telemetry::metrics::PHASE_LABELS`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::HandshakePending => "handshake_pending",
            Self::AwaitingCreateAck => "awaiting_create_ack",
            Self::AwaitingStatusAck => "awaiting_status_ack",
            Self::AwaitingCancelAck => "awaiting_cancel_ack",
            Self::AwaitingInvalidCreateReject => "awaiting_invalid_create_reject",
            Self::AwaitingInvalidCancelReject => "awaiting_invalid_cancel_reject",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
