//! Workflow controller.
//!
//! Implements the session engine's `Application` hooks and drives the
//! scripted lifecycle:
//!
//! 1. Logon: sign the outgoing Logon with the session secret
//! 2. Logon accepted: submit the primary order
//! 3. Execution reports: status request after the ack, cancel after the status
//! 4. Heartbeats: invalid create, then invalid cancel, then terminate
//!
//! Every outbound request is built here and handed to the `SendQueue`; the
//! callbacks themselves never block on the network.

use std::collections::HashMap;
use std::sync::Arc;

use fixprobe_core::{
    tags, ClOrdId, ExecType, Message, MsgType, OrdStatus, OrdType, SessionId,
};
use fixprobe_executor::{
    ClOrdIdGenerator, Clock, LogonSigner, OrderBuilder, OutboundRequest, RequestKind, SendQueue,
    SystemClock,
};
use fixprobe_session::{Application, SessionError, SessionResult, SessionSecret, SessionSettings};
use fixprobe_telemetry::Metrics;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WorkflowConfig;
use crate::error::WorkflowResult;
use crate::phase::WorkflowPhase;
use crate::state::{ProbeStep, ReportAction, WorkflowState};

/// Exit status reported once the probe sequence completes.
pub const EXIT_SUCCESS: u8 = 0;

/// Drives the order lifecycle and the invalid-request probes.
pub struct WorkflowController<C: Clock = SystemClock> {
    config: WorkflowConfig,
    settings: SessionSettings,
    secrets: RwLock<HashMap<SessionId, SessionSecret>>,
    state: WorkflowState,
    ids: ClOrdIdGenerator<C>,
    builder: OrderBuilder,
    signer: LogonSigner,
    queue: Arc<SendQueue>,
    shutdown: CancellationToken,
}

impl WorkflowController<SystemClock> {
    pub fn new(config: WorkflowConfig, settings: SessionSettings, queue: Arc<SendQueue>) -> Self {
        Self::with_id_generator(config, settings, queue, ClOrdIdGenerator::with_system_clock())
    }
}

impl<C: Clock> WorkflowController<C> {
    /// Construct with an injected id generator (deterministic ids in tests).
    pub fn with_id_generator(
        config: WorkflowConfig,
        settings: SessionSettings,
        queue: Arc<SendQueue>,
        ids: ClOrdIdGenerator<C>,
    ) -> Self {
        Self {
            config,
            settings,
            secrets: RwLock::new(HashMap::new()),
            state: WorkflowState::new(),
            ids,
            builder: OrderBuilder,
            signer: LogonSigner,
            queue,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    /// Cancelled when the probe sequence completes.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// `Some(0)` once terminated, `None` while the workflow is still running.
    pub fn exit_code(&self) -> Option<u8> {
        self.state.is_terminated().then_some(EXIT_SUCCESS)
    }

    // =========================================================================
    // Inbound dispatch
    // =========================================================================

    fn on_message(&self, message: &Message, session: &SessionId) {
        let msg_type = message.msg_type();
        Metrics::inbound_message(msg_type.as_str());

        match msg_type {
            MsgType::ExecutionReport => self.on_execution_report(message, session),
            MsgType::Reject => self.on_reject(message, session, "session"),
            MsgType::BusinessMessageReject => self.on_reject(message, session, "business"),
            MsgType::Heartbeat => self.on_heartbeat(session),
            other => {
                debug!(session = %session, msg_type = %other, seq_num = ?message.seq_num(), "Inbound message");
            }
        }
    }

    fn on_execution_report(&self, message: &Message, session: &SessionId) {
        let exec_type_raw = message.field(tags::EXEC_TYPE).unwrap_or("");
        let exec_type = ExecType::from_fix(exec_type_raw);
        let ord_status = message.field(tags::ORD_STATUS).and_then(OrdStatus::from_fix);
        let cl_ord_id = message.field(tags::CL_ORD_ID).unwrap_or("");

        info!(
            session = %session,
            cl_ord_id,
            exec_type = exec_type_raw,
            ord_status = ?ord_status,
            "Execution report received"
        );

        match self.state.on_execution_report(exec_type) {
            ReportAction::Ignore(reason) => {
                debug!(session = %session, cl_ord_id, reason = ?reason, "Execution report ignored");
            }
            ReportAction::LogCanceled => {
                info!(session = %session, cl_ord_id, "Order canceled");
            }
            ReportAction::SubmitCancel { primary } => {
                let cancel_id = self.ids.next_request_id();
                let cancel = self.builder.cancel_request(&primary, &cancel_id);
                info!(session = %session, orig_cl_ord_id = %primary, cl_ord_id = %cancel_id, "Order status received, cancelling");
                self.submit(session, RequestKind::CancelRequest, cancel_id, Ok(cancel));
            }
            ReportAction::SubmitStatus { primary, expected } => {
                if !expected {
                    warn!(session = %session, cl_ord_id, exec_type = exec_type_raw, "Unexpected execution type");
                }
                match message.field(tags::ORD_TYPE).map(OrdType::from_fix) {
                    Some(Ok(OrdType::Market)) => info!(session = %session, cl_ord_id, "Market order acknowledged"),
                    Some(Ok(OrdType::Limit)) => info!(session = %session, cl_ord_id, "Limit order acknowledged"),
                    _ => debug!(session = %session, cl_ord_id, "Order type not reported"),
                }
                let status = self.builder.status_request(&primary);
                self.submit(session, RequestKind::StatusRequest, primary, Ok(status));
            }
        }
    }

    /// Rejects are logged only. Correlation with a probe id is reported but
    /// does not advance the workflow; heartbeats do that.
    fn on_reject(&self, message: &Message, session: &SessionId, source: &str) {
        Metrics::reject_received(source);

        let ref_id = message
            .field(tags::BUSINESS_REJECT_REF_ID)
            .or_else(|| message.field(tags::CL_ORD_ID));
        let probe = ref_id.and_then(|id| self.state.probe_for(id));

        info!(
            session = %session,
            source,
            seq_num = ?message.seq_num(),
            ref_seq_num = ?message.field(tags::REF_SEQ_NUM),
            reason_code = ?message.field(tags::SESSION_REJECT_REASON),
            ref_id = ?ref_id,
            probe = ?probe,
            text = message.field(tags::TEXT).unwrap_or(""),
            "Reject received"
        );
    }

    fn on_heartbeat(&self, session: &SessionId) {
        if self.shutdown.is_cancelled() {
            debug!(session = %session, "Heartbeat after termination ignored");
            return;
        }

        match self.state.next_probe() {
            ProbeStep::NotStarted => {
                debug!(session = %session, "Heartbeat before workflow start");
            }
            ProbeStep::SubmitInvalidCreate(id) => {
                info!(session = %session, cl_ord_id = %id, "Submitting invalid order");
                let order = self
                    .builder
                    .new_order(&self.config.invalid_order_params(), &id);
                self.submit(session, RequestKind::InvalidCreate, id, order);
            }
            ProbeStep::SubmitInvalidCancel(id) => {
                let cancel_id = self.ids.next_request_id();
                info!(session = %session, orig_cl_ord_id = %id, cl_ord_id = %cancel_id, "Submitting invalid cancel");
                let cancel = self.builder.cancel_request(&id, &cancel_id);
                self.submit(session, RequestKind::InvalidCancel, cancel_id, Ok(cancel));
            }
            ProbeStep::Complete => self.terminate(session),
            ProbeStep::AlreadyTerminated => {
                debug!(session = %session, "Heartbeat after termination ignored");
            }
        }
    }

    fn terminate(&self, session: &SessionId) {
        info!(
            session = %session,
            rejected = ?self.state.rejected_ids(),
            "Invalid-request probes attempted, terminating"
        );
        self.queue.close();
        self.shutdown.cancel();
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    fn submit(
        &self,
        session: &SessionId,
        kind: RequestKind,
        cl_ord_id: ClOrdId,
        built: fixprobe_core::Result<Message>,
    ) {
        if let Err(e) = self.try_submit(session, kind, cl_ord_id.clone(), built) {
            error!(
                session = %session,
                kind = %kind,
                cl_ord_id = %cl_ord_id,
                error = %e,
                "Request not submitted"
            );
        }
    }

    fn try_submit(
        &self,
        session: &SessionId,
        kind: RequestKind,
        cl_ord_id: ClOrdId,
        built: fixprobe_core::Result<Message>,
    ) -> WorkflowResult<()> {
        let message = match built {
            Ok(message) => message,
            Err(e) => {
                Metrics::outbound_request(kind.as_str(), "build_failed");
                return Err(e.into());
            }
        };
        self.queue
            .enqueue(OutboundRequest::new(session.clone(), kind, cl_ord_id, message))?;
        Ok(())
    }

    fn secret(&self, session: &SessionId) -> Option<SessionSecret> {
        self.secrets.read().get(session).cloned()
    }
}

impl<C: Clock> Application for WorkflowController<C> {
    fn on_create(&self, session: &SessionId) {
        match self.settings.resolve_secret(session) {
            Ok(secret) => {
                self.secrets.write().insert(session.clone(), secret);
                info!(session = %session, "Session created");
            }
            Err(e) => {
                warn!(session = %session, error = %e, "Session created without a usable secret");
            }
        }
        self.state.disconnected();
    }

    fn on_logon(&self, session: &SessionId) {
        info!(session = %session, "Logon accepted");

        let Some(ids) = self.state.begin_workflow(|| self.ids.next_workflow_ids()) else {
            info!(
                session = %session,
                "Rejections already recorded, not starting a new order"
            );
            return;
        };

        info!(
            session = %session,
            cl_ord_id = %ids.primary,
            invalid_create = %ids.invalid_create,
            invalid_cancel = %ids.invalid_cancel,
            "Submitting order"
        );
        let order = self.builder.new_order(&self.config.order, &ids.primary);
        self.submit(session, RequestKind::NewOrder, ids.primary, order);
    }

    fn on_logout(&self, session: &SessionId) {
        info!(session = %session, phase = %self.state.phase(), "Session ended");
        self.state.disconnected();
    }

    fn to_admin(&self, message: &mut Message, session: &SessionId) -> SessionResult<()> {
        if message.msg_type() != MsgType::Logon {
            return Ok(());
        }

        let secret = self
            .secret(session)
            .ok_or_else(|| SessionError::MissingCredential(session.clone()))?;
        self.signer
            .sign_logon(message, session, &secret)
            .map_err(|e| SessionError::Authentication(e.to_string()))?;

        self.state.handshake_started();
        info!(session = %session, seq_num = ?message.seq_num(), "Logon signed");
        Ok(())
    }

    fn from_admin(&self, message: &Message, session: &SessionId) {
        self.on_message(message, session);
    }

    fn from_app(&self, message: &Message, session: &SessionId) {
        self.on_message(message, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixprobe_executor::ManualClock;
    use fixprobe_session::{MockSessionSender, SessionConfig};
    use std::time::Duration;

    const SECRET: &str = "Zml4cHJvYmUtdGVzdC1zZWNyZXQta2V5LTAxMjM0NTY3ODk=";
    const TS: u64 = 1_704_110_400_000;

    fn session() -> SessionId {
        SessionId::new("FIX.4.4", "CLIENT1", "GATEWAY")
    }

    fn settings(secret: Option<&str>) -> SessionSettings {
        let config = SessionConfig::new("CLIENT1", "GATEWAY");
        let config = match secret {
            Some(secret) => config.with_private_key(secret),
            None => config,
        };
        SessionSettings::new(vec![config])
    }

    struct Harness {
        controller: WorkflowController<ManualClock>,
        sender: Arc<MockSessionSender>,
    }

    impl Harness {
        fn new(secret: Option<&str>) -> Self {
            let sender = Arc::new(MockSessionSender::new());
            let queue = Arc::new(SendQueue::spawn(sender.clone(), Duration::from_secs(2)));
            let controller = WorkflowController::with_id_generator(
                WorkflowConfig::default(),
                settings(secret),
                queue,
                ClOrdIdGenerator::new(ManualClock::new(TS)),
            );
            controller.on_create(&session());
            Self { controller, sender }
        }

        /// Let the paced worker send everything queued so far.
        async fn flush(&self) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }

        fn sent(&self) -> Vec<Message> {
            self.sender.sent_messages()
        }
    }

    fn exec_report(exec_type: ExecType, cl_ord_id: &str) -> Message {
        let mut msg = Message::new(MsgType::ExecutionReport);
        msg.set_field(tags::EXEC_TYPE, exec_type.as_fix());
        msg.set_field(tags::CL_ORD_ID, cl_ord_id);
        msg.set_field(tags::ORD_TYPE, OrdType::Limit.as_fix());
        msg
    }

    fn heartbeat() -> Message {
        Message::new(MsgType::Heartbeat)
    }

    #[tokio::test(start_paused = true)]
    async fn test_logon_is_signed() {
        let h = Harness::new(Some(SECRET));
        let mut logon = Message::new(MsgType::Logon);
        logon.header_mut().set(tags::MSG_SEQ_NUM, "1");
        logon
            .header_mut()
            .set(tags::SENDING_TIME, "20240101-12:00:00.000000");

        h.controller.to_admin(&mut logon, &session()).unwrap();

        assert_eq!(
            logon.field(tags::RAW_DATA),
            Some("SIUthKFGmCwnZ/BGdEwu+3BMpkowyPYqZd8ecGyzJC1Qb8T6edGcXjKMD7dEGh+6DA3eku6EcyjPW+SpLxu3lw==")
        );
        assert_eq!(logon.field(tags::RAW_DATA_LENGTH), Some("88"));
        assert_eq!(h.controller.phase(), WorkflowPhase::HandshakePending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logon_without_secret_is_fatal() {
        let h = Harness::new(None);
        let mut logon = Message::new(MsgType::Logon);
        logon
            .header_mut()
            .set(tags::SENDING_TIME, "20240101-12:00:00.000000");

        let result = h.controller.to_admin(&mut logon, &session());
        assert!(matches!(result, Err(SessionError::MissingCredential(_))));
        assert_eq!(logon.field(tags::RAW_DATA), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logon_with_bad_sending_time_is_fatal() {
        let h = Harness::new(Some(SECRET));
        let mut logon = Message::new(MsgType::Logon);
        logon.header_mut().set(tags::SENDING_TIME, "yesterday");

        let result = h.controller.to_admin(&mut logon, &session());
        assert!(matches!(result, Err(SessionError::Authentication(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_logon_admin_untouched() {
        let h = Harness::new(None);
        let mut hb = heartbeat();
        h.controller.to_admin(&mut hb, &session()).unwrap();
        assert_eq!(hb, heartbeat());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_status_cancel_flow() {
        let h = Harness::new(Some(SECRET));
        h.controller.on_logon(&session());
        assert!(h.sent().is_empty(), "send must wait for pacing");
        h.flush().await;

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].msg_type(), MsgType::NewOrderSingle);
        assert_eq!(sent[0].field(tags::CL_ORD_ID), Some("ID-1704110400000"));
        assert_eq!(sent[0].field(tags::PRICE), Some("5"));

        h.controller
            .from_app(&exec_report(ExecType::New, "ID-1704110400000"), &session());
        h.flush().await;
        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].msg_type(), MsgType::OrderStatusRequest);
        assert_eq!(sent[1].field(tags::CL_ORD_ID), Some("ID-1704110400000"));
        assert_eq!(h.controller.phase(), WorkflowPhase::AwaitingStatusAck);

        h.controller.from_app(
            &exec_report(ExecType::OrderStatus, "ID-1704110400000"),
            &session(),
        );
        h.flush().await;
        let sent = h.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].msg_type(), MsgType::OrderCancelRequest);
        assert_eq!(sent[2].field(tags::ORIG_CL_ORD_ID), Some("ID-1704110400000"));
        assert_eq!(sent[2].field(tags::CL_ORD_ID), Some("ID-1704110400001"));
        assert_eq!(h.controller.phase(), WorkflowPhase::AwaitingCancelAck);

        h.controller.from_app(
            &exec_report(ExecType::Canceled, "ID-1704110400001"),
            &session(),
        );
        h.flush().await;
        assert_eq!(h.sent().len(), 3);
        assert_eq!(h.controller.phase(), WorkflowPhase::AwaitingCancelAck);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_drive_probes_then_terminate() {
        let h = Harness::new(Some(SECRET));
        h.controller.on_logon(&session());
        h.flush().await;
        h.sender.clear();
        let token = h.controller.shutdown_token();

        h.controller.from_admin(&heartbeat(), &session());
        h.controller.from_admin(&heartbeat(), &session());
        assert_eq!(
            h.controller.state().rejected_ids(),
            vec![
                ClOrdId::from("1704110400000-InvalidOrderCreate"),
                ClOrdId::from("1704110400000-InvalidOrderCancel"),
            ]
        );
        assert!(!token.is_cancelled());

        h.controller.from_admin(&heartbeat(), &session());
        assert!(token.is_cancelled());
        assert_eq!(h.controller.exit_code(), Some(0));
        assert_eq!(h.controller.phase(), WorkflowPhase::Terminated);

        // Queued probes still go out after termination.
        h.controller.queue.drain().await;
        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].msg_type(), MsgType::NewOrderSingle);
        assert_eq!(
            sent[0].field(tags::CL_ORD_ID),
            Some("1704110400000-InvalidOrderCreate")
        );
        assert_eq!(sent[0].field(tags::ORDER_QTY), Some("10000000000000"));
        assert_eq!(sent[1].msg_type(), MsgType::OrderCancelRequest);
        assert_eq!(
            sent[1].field(tags::ORIG_CL_ORD_ID),
            Some("1704110400000-InvalidOrderCancel")
        );

        // Later heartbeats are no-ops.
        h.controller.from_admin(&heartbeat(), &session());
        assert_eq!(h.controller.exit_code(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_rejection_submits_nothing() {
        let h = Harness::new(Some(SECRET));
        h.controller.on_logon(&session());
        h.controller.from_admin(&heartbeat(), &session());
        h.flush().await;
        let before = h.sent().len();

        h.controller.on_logout(&session());
        assert_eq!(h.controller.phase(), WorkflowPhase::Disconnected);
        h.controller.on_logon(&session());
        h.flush().await;

        assert_eq!(h.sent().len(), before);
        assert_eq!(
            h.controller.state().ids().unwrap().primary.as_str(),
            "ID-1704110400000"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_before_rejection_restarts_workflow() {
        let h = Harness::new(Some(SECRET));
        h.controller.on_logon(&session());
        h.controller.on_logout(&session());
        h.controller.on_logon(&session());
        h.flush().await;

        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        assert_ne!(
            sent[0].field(tags::CL_ORD_ID),
            sent[1].field(tags::CL_ORD_ID)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_does_not_change_state() {
        let h = Harness::new(Some(SECRET));
        h.controller.on_logon(&session());
        h.controller.from_admin(&heartbeat(), &session());
        let phase = h.controller.phase();
        let rejected = h.controller.state().rejected_ids();

        let mut reject = Message::new(MsgType::BusinessMessageReject);
        reject.set_field(tags::BUSINESS_REJECT_REF_ID, "1704110400000-InvalidOrderCreate");
        reject.set_field(tags::TEXT, "Quantity too large");
        h.controller.from_app(&reject, &session());

        let mut session_reject = Message::new(MsgType::Reject);
        session_reject.set_field(tags::REF_SEQ_NUM, "3");
        h.controller.from_admin(&session_reject, &session());

        assert_eq!(h.controller.phase(), phase);
        assert_eq!(h.controller.state().rejected_ids(), rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_before_logon_is_skipped() {
        let h = Harness::new(Some(SECRET));
        h.controller.from_admin(&heartbeat(), &session());
        h.flush().await;

        assert!(h.sent().is_empty());
        assert!(!h.controller.state().has_rejections());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbuildable_probe_still_counts_as_attempted() {
        let sender = Arc::new(MockSessionSender::new());
        let queue = Arc::new(SendQueue::spawn(sender.clone(), Duration::ZERO));
        let mut config = WorkflowConfig::default();
        config.invalid_order.quantity = "not-a-number".to_string();
        let controller = WorkflowController::with_id_generator(
            config,
            settings(Some(SECRET)),
            queue,
            ClOrdIdGenerator::new(ManualClock::new(TS)),
        );

        controller.on_logon(&session());
        controller.from_admin(&heartbeat(), &session());
        controller.from_admin(&heartbeat(), &session());
        controller.queue.drain().await;

        let kinds: Vec<_> = sender
            .sent_messages()
            .iter()
            .map(Message::msg_type)
            .collect();
        assert_eq!(
            kinds,
            vec![MsgType::NewOrderSingle, MsgType::OrderCancelRequest]
        );
        assert_eq!(
            controller.phase(),
            WorkflowPhase::AwaitingInvalidCancelReject
        );
    }
}
