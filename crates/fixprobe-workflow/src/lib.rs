//! Scripted order lifecycle for gateway conformance probing.
//!
//! [`WorkflowController`] implements the session engine's `Application`
//! hooks. It signs the Logon, walks one order through create, status and
//! cancel, then uses heartbeats to sequence two invalid requests before
//! signalling termination.

pub mod config;
pub mod controller;
pub mod error;
pub mod phase;
pub mod state;

pub use config::{InvalidOrderParams, WorkflowConfig};
pub use controller::{WorkflowController, EXIT_SUCCESS};
pub use error::{WorkflowError, WorkflowResult};
pub use phase::WorkflowPhase;
pub use state::{IgnoreReason, ProbeStep, ReportAction, WorkflowState};
