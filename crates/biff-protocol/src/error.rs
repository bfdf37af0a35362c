//! Protocol error types.

use thiserror::Error;

/// Infrastructure failures. Rejected secrets and unknown node keys are not
/// errors; they are answered with `node_invalid: true`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("enrollment store error: {0}")]
    Storage(#[from] biff_state::StateError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
