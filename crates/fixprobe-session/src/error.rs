//! Session error types.

use fixprobe_core::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session not logged on: {0}")]
    NotLoggedOn(SessionId),

    #[error("No credential configured for session {0}")]
    MissingCredential(SessionId),

    #[error("Credential source error: {0}")]
    CredentialSource(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl SessionError {
    /// Send failures leave the workflow able to retry on the next trigger.
    pub fn is_send_failure(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::NotLoggedOn(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
