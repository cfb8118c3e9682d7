//! Per-session workflow state.
//!
//! All reads and writes go through one mutex. Each public operation is a
//! complete read-modify-write under that lock, so a heartbeat and an
//! execution report arriving back to back can never both act on stale state.

use fixprobe_core::{ClOrdId, ExecType, ProbeKind};
use fixprobe_executor::WorkflowIds;
use fixprobe_telemetry::Metrics;
use parking_lot::Mutex;

use crate::phase::WorkflowPhase;

/// What to do about an inbound execution report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportAction {
    /// The workflow does not track acknowledgements right now.
    Ignore(IgnoreReason),
    /// Cancel confirmed. Nothing further.
    LogCanceled,
    /// Status answered: cancel `primary`.
    SubmitCancel { primary: ClOrdId },
    /// Order acknowledged (or unexpected type): query `primary`.
    SubmitStatus { primary: ClOrdId, expected: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Invalid-request probing has begun.
    ProbingStarted,
    /// No order has been submitted yet.
    NoActiveOrder,
}

/// Next step of the invalid-request sequence, decided on a heartbeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStep {
    /// Ids not assigned yet (heartbeat before the first logon).
    NotStarted,
    SubmitInvalidCreate(ClOrdId),
    SubmitInvalidCancel(ClOrdId),
    /// Both probes attempted; the phase is now `Terminated`.
    Complete,
    /// Terminal condition already reported once.
    AlreadyTerminated,
}

#[derive(Debug, Default)]
struct Inner {
    phase: WorkflowPhase,
    ids: Option<WorkflowIds>,
    /// Grows monotonically. Doubles as the "probe attempted" marker.
    rejected: Vec<ClOrdId>,
}

impl Inner {
    fn set_phase(&mut self, phase: WorkflowPhase) {
        self.phase = phase;
        Metrics::workflow_phase_set(phase.as_str());
    }

    fn probe_recorded(&self, kind: ProbeKind) -> bool {
        self.rejected.iter().any(|id| id.probe_kind() == Some(kind))
    }

    fn record(&mut self, id: ClOrdId) {
        if !self.rejected.contains(&id) {
            self.rejected.push(id);
        }
    }
}

/// Mutable workflow state for one session.
#[derive(Debug, Default)]
pub struct WorkflowState {
    inner: Mutex<Inner>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.inner.lock().phase
    }

    pub fn ids(&self) -> Option<WorkflowIds> {
        self.inner.lock().ids.clone()
    }

    /// Ids recorded so far, in recording order.
    pub fn rejected_ids(&self) -> Vec<ClOrdId> {
        self.inner.lock().rejected.clone()
    }

    pub fn has_rejections(&self) -> bool {
        !self.inner.lock().rejected.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().phase == WorkflowPhase::Terminated
    }

    /// Logon about to be sent. No effect once terminated.
    pub fn handshake_started(&self) {
        let mut inner = self.inner.lock();
        if inner.phase != WorkflowPhase::Terminated {
            inner.set_phase(WorkflowPhase::HandshakePending);
        }
    }

    /// Session ended. Ids and recorded rejections survive for the reconnect.
    pub fn disconnected(&self) {
        let mut inner = self.inner.lock();
        if inner.phase != WorkflowPhase::Terminated {
            inner.set_phase(WorkflowPhase::Disconnected);
        }
    }

    /// Start a workflow run after logon.
    ///
    /// Returns `None`, leaving ids untouched, once any rejection has been
    /// recorded. Otherwise assigns fresh ids from `next_ids` and moves to
    /// `AwaitingCreateAck`.
    pub fn begin_workflow(&self, next_ids: impl FnOnce() -> WorkflowIds) -> Option<WorkflowIds> {
        let mut inner = self.inner.lock();
        if !inner.rejected.is_empty() || inner.phase == WorkflowPhase::Terminated {
            return None;
        }
        let ids = next_ids();
        inner.ids = Some(ids.clone());
        inner.set_phase(WorkflowPhase::AwaitingCreateAck);
        Some(ids)
    }

    /// Decide how to react to an execution report and advance the phase.
    pub fn on_execution_report(&self, exec_type: Option<ExecType>) -> ReportAction {
        let mut inner = self.inner.lock();
        if !inner.rejected.is_empty() {
            return ReportAction::Ignore(IgnoreReason::ProbingStarted);
        }
        let Some(primary) = inner.ids.as_ref().map(|ids| ids.primary.clone()) else {
            return ReportAction::Ignore(IgnoreReason::NoActiveOrder);
        };

        match exec_type {
            Some(ExecType::Canceled) => ReportAction::LogCanceled,
            Some(ExecType::OrderStatus) => {
                inner.set_phase(WorkflowPhase::AwaitingCancelAck);
                ReportAction::SubmitCancel { primary }
            }
            other => {
                inner.set_phase(WorkflowPhase::AwaitingStatusAck);
                ReportAction::SubmitStatus {
                    primary,
                    expected: other.is_some_and(|t| t.is_order_ack()),
                }
            }
        }
    }

    /// Advance the invalid-request sequence by one step.
    ///
    /// The probe id is recorded before the request is sent; a later heartbeat
    /// never re-issues a recorded probe.
    pub fn next_probe(&self) -> ProbeStep {
        let mut inner = self.inner.lock();
        if inner.phase == WorkflowPhase::Terminated {
            return ProbeStep::AlreadyTerminated;
        }
        let Some(ids) = inner.ids.clone() else {
            return ProbeStep::NotStarted;
        };

        if !inner.probe_recorded(ProbeKind::InvalidCreate) {
            inner.record(ids.invalid_create.clone());
            inner.set_phase(WorkflowPhase::AwaitingInvalidCreateReject);
            ProbeStep::SubmitInvalidCreate(ids.invalid_create)
        } else if !inner.probe_recorded(ProbeKind::InvalidCancel) {
            inner.record(ids.invalid_cancel.clone());
            inner.set_phase(WorkflowPhase::AwaitingInvalidCancelReject);
            ProbeStep::SubmitInvalidCancel(ids.invalid_cancel)
        } else {
            inner.set_phase(WorkflowPhase::Terminated);
            ProbeStep::Complete
        }
    }

    /// Which probe, if any, `id` was issued for in this run.
    pub fn probe_for(&self, id: &str) -> Option<ProbeKind> {
        let inner = self.inner.lock();
        let ids = inner.ids.as_ref()?;
        [ProbeKind::InvalidCreate, ProbeKind::InvalidCancel]
            .into_iter()
            .find(|kind| ids.probe(*kind).as_str() == id)
    }
}
