//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] fixprobe_workflow::WorkflowError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] fixprobe_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
