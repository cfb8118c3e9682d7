//! Prometheus metrics and structured logging for fixprobe.
//!
//! - Structured logging with tracing (pretty for development, JSON in production)
//! - Prometheus counters and gauges for inbound/outbound traffic and workflow phase
//! - Text exposition snapshot for end-of-run logging

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
