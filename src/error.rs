//! Error types for outbox.

use thiserror::Error;

/// All errors that can occur in outbox.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// A command was rejected by the queueability check while the backend
    /// was unreachable. The caller must treat the operation as failed.
    #[error("command is not queueable while offline: '{0}'")]
    NotQueueable(String),

    /// A direct backend dispatch failed.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// The durable queue snapshot could not be read or written. Mutating
    /// operations surface this instead of acknowledging unpersisted state.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error (missing directories, unparseable config file,
    /// invalid command-line input).
    #[error("configuration error: {0}")]
    Config(String),

    /// A requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON parse or serialization error.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
