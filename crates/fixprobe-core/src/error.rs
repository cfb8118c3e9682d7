//! Error types for fixprobe-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid numeric field {field}: {value:?}")]
    InvalidNumericField { field: &'static str, value: String },

    #[error("Invalid sending time {value:?}: {reason}")]
    TimestampParse { value: String, reason: String },

    #[error("Missing required field: tag {0}")]
    MissingField(u32),

    #[error("Invalid value for tag {tag}: {value:?}")]
    InvalidFieldValue { tag: u32, value: String },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
