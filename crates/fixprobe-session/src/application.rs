//! Callback interface the session engine drives.
//!
//! The engine owns the transport, sequence numbers and heartbeats. It calls
//! these hooks on its own tasks and serializes calls per session, so an
//! implementation only has to guard state that it shares with other tasks.

use crate::error::SessionResult;
use fixprobe_core::{Message, SessionId};

/// Protocol-event hooks implemented by the client.
pub trait Application: Send + Sync {
    /// A session was created from configuration. Called once per session.
    fn on_create(&self, session: &SessionId);

    /// The counterparty accepted the logon.
    fn on_logon(&self, session: &SessionId);

    /// The session ended (logout or disconnect).
    fn on_logout(&self, session: &SessionId);

    /// An admin message is about to be sent. Returning an error aborts the
    /// send; for a Logon this aborts session establishment.
    fn to_admin(&self, message: &mut Message, session: &SessionId) -> SessionResult<()>;

    /// An application message is about to be sent.
    fn to_app(&self, _message: &mut Message, _session: &SessionId) -> SessionResult<()> {
        Ok(())
    }

    /// An admin message (heartbeat, reject, logon, logout) was received.
    fn from_admin(&self, message: &Message, session: &SessionId);

    /// An application message (execution report, business reject) was received.
    fn from_app(&self, message: &Message, session: &SessionId);
}
