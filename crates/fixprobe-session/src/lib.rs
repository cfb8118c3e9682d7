//! Session engine boundary for fixprobe.
//!
//! The session engine (transport, sequence numbers, resends, heartbeats) is
//! an external collaborator. This crate defines what the client needs from it:
//! - `Application`: lifecycle and message callbacks the engine drives
//! - `SessionSender`: the send primitive, with a recording mock
//! - `SessionSettings`: per-session configuration and secret lookup

pub mod application;
pub mod error;
pub mod sender;
pub mod settings;

pub use application::Application;
pub use error::{SessionError, SessionResult};
pub use sender::{DynSessionSender, MockOutcome, MockSessionSender, SessionSender};
pub use settings::{KeySource, SessionConfig, SessionSecret, SessionSettings};
