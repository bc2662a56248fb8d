//! Error taxonomy for buffer, configuration and training failures.

use thiserror::Error;

/// Errors surfaced by the replay buffer, the estimators and the training loop.
///
/// Configuration errors are raised at construction time; the remaining
/// variants are raised during training and are meant to abort the run at the
/// episode boundary rather than let it continue with corrupted state.
#[derive(Debug, Error)]
pub enum RlError {
    /// An invalid hyperparameter was supplied at construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A sample was requested from a buffer with zero entries.
    #[error("cannot sample from an empty transition buffer")]
    EmptyBuffer,

    /// A gradient update was handed an empty or ill-formed batch.
    #[error("malformed transition batch: {0}")]
    MalformedBatch(String),

    /// A forward or backward pass produced non-finite values.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

impl RlError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
