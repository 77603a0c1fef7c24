//! Error types
//!
//! Configuration problems are caught before the loop starts. Sensor and sink
//! errors are recoverable: the tick is skipped or the write is dropped.

use thiserror::Error;

use crate::types::{Event, State};

/// Rejected configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("duplicate transition for ({state}, {event})")]
    DuplicateTransition { state: State, event: Event },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Field-level validation failure
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A distance source produced no usable reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("timed out waiting for echo")]
    EchoTimeout,

    #[error("malformed reading: {0}")]
    Malformed(String),

    /// Finite sources only (scripts, stdin)
    #[error("distance source exhausted")]
    Exhausted,
}

/// A text sink rejected a write
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink is not available")]
    Unavailable,

    #[error("cursor ({line}, {column}) out of bounds for {rows}x{columns} display")]
    CursorOutOfBounds {
        line: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for configuration-time operations
pub type ConfigResult<T> = Result<T, ConfigError>;
