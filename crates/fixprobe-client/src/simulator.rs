//! In-process gateway engine.
//!
//! Stands in for the external session engine so the client can run end to
//! end without a network counterparty. Per configured session it:
//! - builds and signs-via-application the Logon, then verifies the HMAC
//! - delivers heartbeats every `heartbeat_interval_secs`
//! - answers order-entry requests serially from a small in-memory book
//!
//! Callbacks for one session are always invoked from that session's task,
//! one at a time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fixprobe_core::time::format_sending_time;
use fixprobe_core::{tags, ExecType, Message, MsgType, OrdStatus, OrdType, SessionId, Side};
use fixprobe_executor::LogonSigner;
use fixprobe_session::{
    Application, SessionConfig, SessionError, SessionResult, SessionSender, SessionSettings,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Simulated gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Largest accepted order quantity. Default: 1,000,000.
    #[serde(default = "default_max_order_qty")]
    pub max_order_qty: Decimal,
    /// Tradable symbols. Default: ["BAT-AUD"].
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Check the Logon HMAC against the session secret. Default: true.
    #[serde(default = "default_verify_signature")]
    pub verify_signature: bool,
}

fn default_max_order_qty() -> Decimal {
    Decimal::from(1_000_000u64)
}

fn default_symbols() -> Vec<String> {
    vec!["BAT-AUD".to_string()]
}

fn default_verify_signature() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_order_qty: default_max_order_qty(),
            symbols: default_symbols(),
            verify_signature: default_verify_signature(),
        }
    }
}

// =============================================================================
// Per-session order handling
// =============================================================================

#[derive(Debug, Clone)]
struct OrderRecord {
    order_id: String,
    symbol: String,
    side: Side,
    ord_type: OrdType,
    quantity: Decimal,
    price: Option<Decimal>,
    status: OrdStatus,
}

/// Why a client request was refused.
#[derive(Debug)]
enum Rejection {
    /// Malformed message. Answered with a session-level Reject (3).
    Session { reason: &'static str, text: String },
    /// Well-formed but unacceptable. Answered with a BusinessMessageReject (j).
    Business { ref_id: String, text: String },
}

// SessionRejectReason (373) values used here.
const REASON_REQUIRED_TAG_MISSING: &str = "1";
const REASON_VALUE_INCORRECT: &str = "5";
const REASON_INVALID_MSG_TYPE: &str = "11";

fn required(message: &Message, tag: u32) -> Result<&str, Rejection> {
    message.field(tag).ok_or_else(|| Rejection::Session {
        reason: REASON_REQUIRED_TAG_MISSING,
        text: format!("Required tag missing: {tag}"),
    })
}

fn business(ref_id: &str, text: impl Into<String>) -> Rejection {
    Rejection::Business {
        ref_id: ref_id.to_string(),
        text: text.into(),
    }
}

/// Gateway side of one session: sequence numbers and the order book.
pub struct GatewaySession {
    id: SessionId,
    config: GatewayConfig,
    orders: HashMap<String, OrderRecord>,
    next_out_seq: u64,
    next_in_seq: u64,
    next_order_id: u64,
    next_exec_id: u64,
}

impl GatewaySession {
    /// `id` is the client's view of the session (sender = client).
    pub fn new(id: SessionId, config: GatewayConfig) -> Self {
        Self {
            id,
            config,
            orders: HashMap::new(),
            next_out_seq: 1,
            next_in_seq: 1,
            next_order_id: 1,
            next_exec_id: 1,
        }
    }

    /// Number of orders in the book, in any state.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn stamp(&mut self, mut message: Message) -> Message {
        let seq = self.next_out_seq;
        self.next_out_seq += 1;

        let header = message.header_mut();
        header.set(tags::BEGIN_STRING, self.id.begin_string.as_str());
        header.set(tags::MSG_SEQ_NUM, seq.to_string());
        header.set(tags::SENDER_COMP_ID, self.id.target_comp_id.as_str());
        header.set(tags::TARGET_COMP_ID, self.id.sender_comp_id.as_str());
        header.set(tags::SENDING_TIME, format_sending_time(Utc::now()));
        message
    }

    pub fn logon_ack(&mut self, heartbeat_secs: u64) -> Message {
        let mut ack = Message::new(MsgType::Logon);
        ack.set_field(tags::ENCRYPT_METHOD, "0");
        ack.set_field(tags::HEART_BT_INT, heartbeat_secs.to_string());
        self.stamp(ack)
    }

    pub fn logout(&mut self, text: &str) -> Message {
        let mut logout = Message::new(MsgType::Logout);
        logout.set_field(tags::TEXT, text);
        self.stamp(logout)
    }

    pub fn heartbeat(&mut self) -> Message {
        self.stamp(Message::new(MsgType::Heartbeat))
    }

    /// Process one client message and return the gateway's answers.
    pub fn handle(&mut self, message: &Message) -> Vec<Message> {
        let ref_seq = self.next_in_seq;
        self.next_in_seq += 1;
        let msg_type = message.msg_type();

        let result = match &msg_type {
            MsgType::NewOrderSingle => self.on_new_order(message),
            MsgType::OrderStatusRequest => self.on_status_request(message),
            MsgType::OrderCancelRequest => self.on_cancel_request(message),
            other => Err(Rejection::Session {
                reason: REASON_INVALID_MSG_TYPE,
                text: format!("Unsupported message type {other}"),
            }),
        };

        let response = match result {
            Ok(report) => report,
            Err(rejection) => {
                debug!(session = %self.id, ?rejection, "Request rejected");
                reject_message(rejection, ref_seq, &msg_type)
            }
        };
        vec![self.stamp(response)]
    }

    fn on_new_order(&mut self, message: &Message) -> Result<Message, Rejection> {
        let cl_ord_id = required(message, tags::CL_ORD_ID)?.to_string();
        let symbol = required(message, tags::SYMBOL)?.to_string();
        let side = Side::from_fix(required(message, tags::SIDE)?).map_err(|e| {
            Rejection::Session {
                reason: REASON_VALUE_INCORRECT,
                text: e.to_string(),
            }
        })?;
        let ord_type = OrdType::from_fix(required(message, tags::ORD_TYPE)?).map_err(|e| {
            Rejection::Session {
                reason: REASON_VALUE_INCORRECT,
                text: e.to_string(),
            }
        })?;
        let quantity: Decimal = required(message, tags::ORDER_QTY)?
            .parse()
            .map_err(|_| business(&cl_ord_id, "Invalid order quantity"))?;
        let price = if ord_type.requires_price() {
            let price: Decimal = required(message, tags::PRICE)?
                .parse()
                .map_err(|_| business(&cl_ord_id, "Invalid price"))?;
            Some(price)
        } else {
            None
        };

        if self.orders.contains_key(&cl_ord_id) {
            return Err(business(&cl_ord_id, "Duplicate ClOrdID"));
        }
        if !self.config.symbols.iter().any(|s| s == &symbol) {
            return Err(business(&cl_ord_id, format!("Unknown symbol {symbol}")));
        }
        if quantity <= Decimal::ZERO {
            return Err(business(&cl_ord_id, "Order quantity must be positive"));
        }
        if quantity > self.config.max_order_qty {
            return Err(business(
                &cl_ord_id,
                format!(
                    "Order quantity {quantity} exceeds maximum {}",
                    self.config.max_order_qty
                ),
            ));
        }

        let record = OrderRecord {
            order_id: format!("O-{}", self.next_order_id),
            symbol,
            side,
            ord_type,
            quantity,
            price,
            status: OrdStatus::New,
        };
        self.next_order_id += 1;
        self.orders.insert(cl_ord_id.clone(), record.clone());
        Ok(self.execution_report(ExecType::New, &cl_ord_id, None, &record))
    }

    fn on_status_request(&mut self, message: &Message) -> Result<Message, Rejection> {
        let cl_ord_id = required(message, tags::CL_ORD_ID)?.to_string();
        let record = self
            .orders
            .get(&cl_ord_id)
            .cloned()
            .ok_or_else(|| business(&cl_ord_id, "Unknown order"))?;
        Ok(self.execution_report(ExecType::OrderStatus, &cl_ord_id, None, &record))
    }

    fn on_cancel_request(&mut self, message: &Message) -> Result<Message, Rejection> {
        let orig_cl_ord_id = required(message, tags::ORIG_CL_ORD_ID)?.to_string();
        let cl_ord_id = required(message, tags::CL_ORD_ID)?.to_string();

        let record = self
            .orders
            .get_mut(&orig_cl_ord_id)
            .ok_or_else(|| business(&orig_cl_ord_id, "Unknown order"))?;
        if !record.status.is_open() {
            return Err(business(&orig_cl_ord_id, "Order not open"));
        }
        record.status = OrdStatus::Canceled;
        let record = record.clone();

        Ok(self.execution_report(
            ExecType::Canceled,
            &cl_ord_id,
            Some(&orig_cl_ord_id),
            &record,
        ))
    }

    fn execution_report(
        &mut self,
        exec_type: ExecType,
        cl_ord_id: &str,
        orig_cl_ord_id: Option<&str>,
        record: &OrderRecord,
    ) -> Message {
        let exec_id = self.next_exec_id;
        self.next_exec_id += 1;

        let leaves = if record.status.is_open() {
            record.quantity
        } else {
            Decimal::ZERO
        };

        let mut report = Message::new(MsgType::ExecutionReport);
        report.set_field(tags::ORDER_ID, record.order_id.as_str());
        report.set_field(tags::EXEC_ID, format!("E-{exec_id}"));
        report.set_field(tags::EXEC_TYPE, exec_type.as_fix());
        report.set_field(tags::ORD_STATUS, record.status.as_fix());
        report.set_field(tags::CL_ORD_ID, cl_ord_id);
        if let Some(orig) = orig_cl_ord_id {
            report.set_field(tags::ORIG_CL_ORD_ID, orig);
        }
        report.set_field(tags::SYMBOL, record.symbol.as_str());
        report.set_field(tags::SIDE, record.side.as_fix());
        report.set_field(tags::ORD_TYPE, record.ord_type.as_fix());
        if let Some(price) = record.price {
            report.set_field(tags::PRICE, price.to_string());
        }
        report.set_field(tags::ORDER_QTY, record.quantity.to_string());
        report.set_field(tags::CUM_QTY, "0");
        report.set_field(tags::LEAVES_QTY, leaves.to_string());
        report
    }
}

fn reject_message(rejection: Rejection, ref_seq: u64, ref_msg_type: &MsgType) -> Message {
    match rejection {
        Rejection::Session { reason, text } => {
            let mut reject = Message::new(MsgType::Reject);
            reject.set_field(tags::REF_SEQ_NUM, ref_seq.to_string());
            reject.set_field(tags::REF_MSG_TYPE, ref_msg_type.as_str());
            reject.set_field(tags::SESSION_REJECT_REASON, reason);
            reject.set_field(tags::TEXT, text);
            reject
        }
        Rejection::Business { ref_id, text } => {
            let mut reject = Message::new(MsgType::BusinessMessageReject);
            reject.set_field(tags::REF_SEQ_NUM, ref_seq.to_string());
            reject.set_field(tags::REF_MSG_TYPE, ref_msg_type.as_str());
            reject.set_field(tags::BUSINESS_REJECT_REF_ID, ref_id);
            reject.set_field(tags::TEXT, text);
            reject
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

struct SessionLink {
    inbound: mpsc::UnboundedSender<Message>,
    logged_on: Arc<AtomicBool>,
}

/// Session engine backed by `GatewaySession`s.
pub struct SimulatedGateway {
    config: GatewayConfig,
    settings: SessionSettings,
    links: RwLock<HashMap<SessionId, SessionLink>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
    signer: LogonSigner,
}

impl SimulatedGateway {
    pub fn new(config: GatewayConfig, settings: SessionSettings) -> Self {
        Self {
            config,
            settings,
            links: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
            signer: LogonSigner,
        }
    }

    /// Create every configured session and start its task.
    ///
    /// Calls `on_create` for each session before any other callback.
    pub fn start(self: &Arc<Self>, app: Arc<dyn Application>) {
        for session_config in self.settings.iter() {
            let id = session_config.session_id();
            app.on_create(&id);

            let (tx, rx) = mpsc::unbounded_channel();
            let logged_on = Arc::new(AtomicBool::new(false));
            self.links.write().insert(
                id.clone(),
                SessionLink {
                    inbound: tx,
                    logged_on: logged_on.clone(),
                },
            );

            let task = tokio::spawn(self.clone().run_session(
                app.clone(),
                session_config.clone(),
                rx,
                logged_on,
            ));
            self.tasks.lock().push(task);
            info!(session = %id, "Gateway session started");
        }
    }

    pub fn is_logged_on(&self, session: &SessionId) -> bool {
        self.links
            .read()
            .get(session)
            .map(|link| link.logged_on.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Stop all session tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Gateway session task failed");
            }
        }
        info!("Gateway stopped");
    }

    async fn run_session(
        self: Arc<Self>,
        app: Arc<dyn Application>,
        session_config: SessionConfig,
        mut inbound: mpsc::UnboundedReceiver<Message>,
        logged_on: Arc<AtomicBool>,
    ) {
        let id = session_config.session_id();
        let mut session = GatewaySession::new(id.clone(), self.config.clone());

        if !self.handshake(app.as_ref(), &session_config, &mut session) {
            return;
        }
        logged_on.store(true, Ordering::SeqCst);
        app.on_logon(&id);

        let period = Duration::from_secs(session_config.heartbeat_interval_secs.max(1));
        let mut heartbeats = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = heartbeats.tick() => {
                    let heartbeat = session.heartbeat();
                    deliver(app.as_ref(), &heartbeat, &id);
                }
                Some(mut message) = inbound.recv() => {
                    if let Err(e) = app.to_app(&mut message, &id) {
                        warn!(session = %id, error = %e, "Outbound message vetoed");
                        continue;
                    }
                    for response in session.handle(&message) {
                        deliver(app.as_ref(), &response, &id);
                    }
                }
            }
        }

        logged_on.store(false, Ordering::SeqCst);
        app.on_logout(&id);
        debug!(session = %id, "Gateway session task stopped");
    }

    /// Logon exchange. Returns whether the session is established.
    fn handshake(
        &self,
        app: &dyn Application,
        session_config: &SessionConfig,
        session: &mut GatewaySession,
    ) -> bool {
        let id = session_config.session_id();

        let mut logon = Message::new(MsgType::Logon);
        let header = logon.header_mut();
        header.set(tags::BEGIN_STRING, id.begin_string.as_str());
        header.set(tags::MSG_SEQ_NUM, "1");
        header.set(tags::SENDER_COMP_ID, id.sender_comp_id.as_str());
        header.set(tags::TARGET_COMP_ID, id.target_comp_id.as_str());
        header.set(tags::SENDING_TIME, format_sending_time(Utc::now()));
        logon.set_field(tags::ENCRYPT_METHOD, "0");
        logon.set_field(
            tags::HEART_BT_INT,
            session_config.heartbeat_interval_secs.to_string(),
        );
        logon.set_field(tags::RESET_SEQ_NUM_FLAG, "Y");

        if let Err(e) = app.to_admin(&mut logon, &id) {
            error!(session = %id, error = %e, "Logon aborted by application");
            return false;
        }

        if self.config.verify_signature {
            let verified = self
                .settings
                .resolve_secret(&id)
                .map_err(|e| e.to_string())
                .and_then(|secret| {
                    self.signer
                        .verify_logon(&logon, &secret)
                        .map_err(|e| e.to_string())
                });
            match verified {
                Ok(true) => debug!(session = %id, "Logon signature verified"),
                Ok(false) => {
                    warn!(session = %id, "Logon signature mismatch");
                    self.refuse(app, session, &id, "Invalid signature");
                    return false;
                }
                Err(reason) => {
                    warn!(session = %id, %reason, "Logon signature could not be checked");
                    self.refuse(app, session, &id, "Signature check failed");
                    return false;
                }
            }
        }

        let ack = session.logon_ack(session_config.heartbeat_interval_secs);
        app.from_admin(&ack, &id);
        true
    }

    fn refuse(
        &self,
        app: &dyn Application,
        session: &mut GatewaySession,
        id: &SessionId,
        text: &str,
    ) {
        let logout = session.logout(text);
        app.from_admin(&logout, id);
        app.on_logout(id);
    }
}

fn deliver(app: &dyn Application, message: &Message, session: &SessionId) {
    if message.msg_type().is_admin() {
        app.from_admin(message, session);
    } else {
        app.from_app(message, session);
    }
}

impl SessionSender for SimulatedGateway {
    fn send_to_target(&self, message: Message, session: &SessionId) -> SessionResult<bool> {
        let links = self.links.read();
        let link = links
            .get(session)
            .ok_or_else(|| SessionError::SessionNotFound(session.clone()))?;
        if !link.logged_on.load(Ordering::SeqCst) {
            return Err(SessionError::NotLoggedOn(session.clone()));
        }
        link.inbound
            .send(message)
            .map_err(|_| SessionError::NotLoggedOn(session.clone()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixprobe_session::SessionSecret;
    use rust_decimal_macros::dec;

    const SECRET: &str = "Zml4cHJvYmUtdGVzdC1zZWNyZXQta2V5LTAxMjM0NTY3ODk=";

    fn session_id() -> SessionId {
        SessionId::new("FIX.4.4", "CLIENT1", "GATEWAY")
    }

    fn gateway_session() -> GatewaySession {
        GatewaySession::new(session_id(), GatewayConfig::default())
    }

    fn new_order(cl_ord_id: &str, quantity: &str) -> Message {
        let mut order = Message::new(MsgType::NewOrderSingle);
        order.set_field(tags::CL_ORD_ID, cl_ord_id);
        order.set_field(tags::SYMBOL, "BAT-AUD");
        order.set_field(tags::SIDE, "1");
        order.set_field(tags::ORD_TYPE, "2");
        order.set_field(tags::PRICE, "5");
        order.set_field(tags::ORDER_QTY, quantity);
        order
    }

    fn cancel(orig: &str, cl_ord_id: &str) -> Message {
        let mut cancel = Message::new(MsgType::OrderCancelRequest);
        cancel.set_field(tags::ORIG_CL_ORD_ID, orig);
        cancel.set_field(tags::CL_ORD_ID, cl_ord_id);
        cancel
    }

    fn single(responses: Vec<Message>) -> Message {
        assert_eq!(responses.len(), 1);
        responses.into_iter().next().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.max_order_qty, dec!(1000000));
        assert_eq!(config.symbols, vec!["BAT-AUD".to_string()]);
        assert!(config.verify_signature);
    }

    #[test]
    fn test_new_order_acknowledged() {
        let mut gw = gateway_session();
        let report = single(gw.handle(&new_order("ID-1", "0.1")));

        assert_eq!(report.msg_type(), MsgType::ExecutionReport);
        assert_eq!(report.field(tags::EXEC_TYPE), Some("0"));
        assert_eq!(report.field(tags::ORD_STATUS), Some("0"));
        assert_eq!(report.field(tags::CL_ORD_ID), Some("ID-1"));
        assert_eq!(report.field(tags::ORD_TYPE), Some("2"));
        assert_eq!(report.field(tags::LEAVES_QTY), Some("0.1"));
        assert_eq!(report.header().get(tags::SENDER_COMP_ID), Some("GATEWAY"));
        assert_eq!(report.header().get(tags::TARGET_COMP_ID), Some("CLIENT1"));
        assert_eq!(gw.order_count(), 1);
    }

    #[test]
    fn test_oversized_order_business_rejected() {
        let mut gw = gateway_session();
        let reject = single(gw.handle(&new_order("1-InvalidOrderCreate", "10000000000000")));

        assert_eq!(reject.msg_type(), MsgType::BusinessMessageReject);
        assert_eq!(
            reject.field(tags::BUSINESS_REJECT_REF_ID),
            Some("1-InvalidOrderCreate")
        );
        assert_eq!(reject.field(tags::REF_MSG_TYPE), Some("D"));
        assert!(reject.field(tags::TEXT).unwrap().contains("exceeds maximum"));
        assert_eq!(gw.order_count(), 0);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let mut gw = gateway_session();
        let mut order = new_order("ID-1", "1");
        order.set_field(tags::SYMBOL, "XYZ-AUD");
        let reject = single(gw.handle(&order));
        assert_eq!(reject.msg_type(), MsgType::BusinessMessageReject);
        assert_eq!(reject.field(tags::TEXT), Some("Unknown symbol XYZ-AUD"));
    }

    #[test]
    fn test_missing_field_session_rejected() {
        let mut gw = gateway_session();
        let mut order = Message::new(MsgType::NewOrderSingle);
        order.set_field(tags::CL_ORD_ID, "ID-1");
        let reject = single(gw.handle(&order));

        assert_eq!(reject.msg_type(), MsgType::Reject);
        assert_eq!(reject.field(tags::SESSION_REJECT_REASON), Some("1"));
        assert_eq!(reject.field(tags::REF_SEQ_NUM), Some("1"));
    }

    #[test]
    fn test_status_then_cancel() {
        let mut gw = gateway_session();
        gw.handle(&new_order("ID-1", "0.1"));

        let mut status = Message::new(MsgType::OrderStatusRequest);
        status.set_field(tags::CL_ORD_ID, "ID-1");
        let report = single(gw.handle(&status));
        assert_eq!(report.field(tags::EXEC_TYPE), Some("I"));
        assert_eq!(report.field(tags::ORD_STATUS), Some("0"));

        let report = single(gw.handle(&cancel("ID-1", "ID-2")));
        assert_eq!(report.field(tags::EXEC_TYPE), Some("4"));
        assert_eq!(report.field(tags::ORD_STATUS), Some("4"));
        assert_eq!(report.field(tags::CL_ORD_ID), Some("ID-2"));
        assert_eq!(report.field(tags::ORIG_CL_ORD_ID), Some("ID-1"));
        assert_eq!(report.field(tags::LEAVES_QTY), Some("0"));

        let reject = single(gw.handle(&cancel("ID-1", "ID-3")));
        assert_eq!(reject.field(tags::TEXT), Some("Order not open"));
    }

    #[test]
    fn test_cancel_unknown_order_rejected() {
        let mut gw = gateway_session();
        let reject = single(gw.handle(&cancel("1-InvalidOrderCancel", "ID-2")));
        assert_eq!(reject.msg_type(), MsgType::BusinessMessageReject);
        assert_eq!(
            reject.field(tags::BUSINESS_REJECT_REF_ID),
            Some("1-InvalidOrderCancel")
        );
    }

    #[test]
    fn test_outbound_sequence_numbers_increase() {
        let mut gw = gateway_session();
        let ack = gw.logon_ack(30);
        let hb = gw.heartbeat();
        assert_eq!(ack.seq_num(), Some(1));
        assert_eq!(hb.seq_num(), Some(2));
    }

    /// Records callbacks and signs the Logon with its own secret.
    struct RecordingApp {
        secret: SessionSecret,
        events: Mutex<Vec<String>>,
    }

    impl RecordingApp {
        fn new(secret: &str) -> Arc<Self> {
            Arc::new(Self {
                secret: SessionSecret::new(secret),
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl Application for RecordingApp {
        fn on_create(&self, _session: &SessionId) {
            self.events.lock().push("create".to_string());
        }

        fn on_logon(&self, _session: &SessionId) {
            self.events.lock().push("logon".to_string());
        }

        fn on_logout(&self, _session: &SessionId) {
            self.events.lock().push("logout".to_string());
        }

        fn to_admin(&self, message: &mut Message, session: &SessionId) -> SessionResult<()> {
            LogonSigner
                .sign_logon(message, session, &self.secret)
                .map_err(|e| SessionError::Authentication(e.to_string()))?;
            Ok(())
        }

        fn from_admin(&self, message: &Message, _session: &SessionId) {
            self.events
                .lock()
                .push(format!("admin:{}", message.msg_type()));
        }

        fn from_app(&self, message: &Message, _session: &SessionId) {
            self.events
                .lock()
                .push(format!("app:{}", message.msg_type()));
        }
    }

    fn engine(heartbeat_secs: u64) -> Arc<SimulatedGateway> {
        let mut config = SessionConfig::new("CLIENT1", "GATEWAY").with_private_key(SECRET);
        config.heartbeat_interval_secs = heartbeat_secs;
        Arc::new(SimulatedGateway::new(
            GatewayConfig::default(),
            SessionSettings::new(vec![config]),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_logon_heartbeat_and_order() {
        let gateway = engine(1);
        let app = RecordingApp::new(SECRET);
        gateway.start(app.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(gateway.is_logged_on(&session_id()));

        assert!(gateway
            .send_to_target(new_order("ID-1", "0.1"), &session_id())
            .unwrap());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        gateway.shutdown().await;

        let events = app.events();
        assert_eq!(&events[..3], &["create", "admin:A", "logon"]);
        assert!(events.contains(&"app:8".to_string()));
        assert!(events.contains(&"admin:0".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("logout"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_refuses_bad_signature() {
        let gateway = engine(30);
        // Valid base64, wrong key.
        let app = RecordingApp::new("d3Jvbmcta2V5");
        gateway.start(app.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!gateway.is_logged_on(&session_id()));
        assert_eq!(app.events(), vec!["create", "admin:5", "logout"]);

        let result = gateway.send_to_target(new_order("ID-1", "0.1"), &session_id());
        assert!(matches!(result, Err(SessionError::NotLoggedOn(_))));
        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let gateway = engine(30);
        let other = SessionId::new("FIX.4.4", "NOBODY", "GATEWAY");
        let result = gateway.send_to_target(new_order("ID-1", "0.1"), &other);
        assert!(matches!(result, Err(SessionError::SessionNotFound(_))));
    }
}
