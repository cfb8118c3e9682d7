//! Executor error types.

use fixprobe_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Send queue is closed")]
    QueueClosed,

    #[error("Send queue is full")]
    QueueFull,

    #[error("Failed to build request: {0}")]
    Build(#[from] CoreError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
