//! Workflow error types.

use fixprobe_core::CoreError;
use fixprobe_executor::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid workflow configuration: {0}")]
    Config(String),

    #[error("Request construction failed: {0}")]
    Build(#[from] CoreError),

    #[error("Dispatch failed: {0}")]
    Executor(#[from] ExecutorError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
