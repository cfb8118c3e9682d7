//! Application wrapper that records inbound traffic before forwarding it.

use std::sync::Arc;

use fixprobe_core::{tags, Message, MsgType, SessionId};
use fixprobe_session::{Application, SessionResult};
use parking_lot::Mutex;

/// One callback observed by the wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created,
    LoggedOn,
    LoggedOut,
    LogonSent { signed: bool },
    Inbound { msg_type: MsgType, cl_ord_id: Option<String>, exec_type: Option<String> },
}

pub struct RecordingApp<A> {
    inner: Arc<A>,
    events: Mutex<Vec<Event>>,
}

impl<A: Application> RecordingApp<A> {
    pub fn new(inner: Arc<A>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Exec types of the execution reports received, in order.
    pub fn exec_types(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Inbound {
                    msg_type: MsgType::ExecutionReport,
                    exec_type,
                    ..
                } => exec_type,
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, msg_type: MsgType) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Inbound { msg_type: t, .. } if *t == msg_type))
            .count()
    }

    fn record_inbound(&self, message: &Message) {
        self.events.lock().push(Event::Inbound {
            msg_type: message.msg_type(),
            cl_ord_id: message
                .field(tags::CL_ORD_ID)
                .or_else(|| message.field(tags::BUSINESS_REJECT_REF_ID))
                .map(str::to_string),
            exec_type: message.field(tags::EXEC_TYPE).map(str::to_string),
        });
    }
}

impl<A: Application> Application for RecordingApp<A> {
    fn on_create(&self, session: &SessionId) {
        self.events.lock().push(Event::Created);
        self.inner.on_create(session);
    }

    fn on_logon(&self, session: &SessionId) {
        self.events.lock().push(Event::LoggedOn);
        self.inner.on_logon(session);
    }

    fn on_logout(&self, session: &SessionId) {
        self.events.lock().push(Event::LoggedOut);
        self.inner.on_logout(session);
    }

    fn to_admin(&self, message: &mut Message, session: &SessionId) -> SessionResult<()> {
        let result = self.inner.to_admin(message, session);
        if message.msg_type() == MsgType::Logon {
            self.events.lock().push(Event::LogonSent {
                signed: message.field(tags::RAW_DATA).is_some(),
            });
        }
        result
    }

    fn from_admin(&self, message: &Message, session: &SessionId) {
        self.record_inbound(message);
        self.inner.from_admin(message, session);
    }

    fn from_app(&self, message: &Message, session: &SessionId) {
        self.record_inbound(message);
        self.inner.from_app(message, session);
    }
}
