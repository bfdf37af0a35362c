//! Error types for the enrollment store.

use thiserror::Error;

/// Result type alias for enrollment store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during enrollment store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open enrollment store: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("enrollment table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("failed to encode enrollment: {0}")]
    Serialize(String),

    #[error("corrupt enrollment record: {0}")]
    Deserialize(String),

    #[error("node key already issued")]
    DuplicateNodeKey,
}
