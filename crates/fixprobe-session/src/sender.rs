//! Send primitive exposed by the session engine.
//!
//! Provides a trait-based abstraction so the outbound queue can be tested
//! without a live engine.

use crate::error::{SessionError, SessionResult};
use fixprobe_core::{Message, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Trait for handing a message to the engine for transmission.
pub trait SessionSender: Send + Sync {
    /// Queue a message on the session.
    ///
    /// Returns `Ok(false)` when the engine accepted the call but declined to
    /// send (e.g. the application vetoed it in `to_app`).
    ///
    /// # Errors
    /// - `SessionError::SessionNotFound`: no such session
    /// - `SessionError::NotLoggedOn`: session exists but is not logged on
    fn send_to_target(&self, message: Message, session: &SessionId) -> SessionResult<bool>;
}

/// Arc wrapper for SessionSender trait objects.
pub type DynSessionSender = Arc<dyn SessionSender>;

/// Outcome the mock returns for the next sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Sent,
    Declined,
    SessionNotFound,
    NotLoggedOn,
}

/// Mock sender for testing. Records every message it is given.
#[derive(Debug)]
pub struct MockSessionSender {
    sends: Mutex<Vec<(SessionId, Message)>>,
    next_outcome: Mutex<MockOutcome>,
}

impl Default for MockSessionSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionSender {
    pub fn new() -> Self {
        Self {
            sends: Mutex::new(Vec::new()),
            next_outcome: Mutex::new(MockOutcome::Sent),
        }
    }

    /// Set the outcome for subsequent sends.
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.next_outcome.lock() = outcome;
    }

    /// Messages passed to `send_to_target`, including failed attempts.
    pub fn sent_messages(&self) -> Vec<Message> {
        self.sends.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn sends(&self) -> Vec<(SessionId, Message)> {
        self.sends.lock().clone()
    }

    pub fn clear(&self) {
        self.sends.lock().clear();
    }
}

impl SessionSender for MockSessionSender {
    fn send_to_target(&self, message: Message, session: &SessionId) -> SessionResult<bool> {
        self.sends.lock().push((session.clone(), message));
        match *self.next_outcome.lock() {
            MockOutcome::Sent => Ok(true),
            MockOutcome::Declined => Ok(false),
            MockOutcome::SessionNotFound => Err(SessionError::SessionNotFound(session.clone())),
            MockOutcome::NotLoggedOn => Err(SessionError::NotLoggedOn(session.clone())),
        }
    }
}
