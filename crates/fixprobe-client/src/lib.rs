//! fixprobe: gateway conformance probe.
//!
//! Drives one scripted order lifecycle against an order-entry gateway and
//! then checks that invalid requests are rejected.

pub mod app;
pub mod config;
pub mod error;
pub mod simulator;

pub use app::{App, RunOutcome, EXIT_INTERRUPTED};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use simulator::{GatewayConfig, GatewaySession, SimulatedGateway};
