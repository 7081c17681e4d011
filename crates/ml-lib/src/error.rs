//! Error types for model lifecycle and prediction

use crate::store::StoreError;
use thiserror::Error;

/// Errors raised by the model wrappers
#[derive(Debug, Error)]
pub enum ModelError {
    /// Feature vector arity does not match the model contract
    #[error("{model}: expected {expected} features, got {actual}")]
    InvalidInput {
        model: &'static str,
        expected: usize,
        actual: usize,
    },

    /// `predict` was called before `initialize` succeeded
    #[error("{model} is not initialized")]
    NotInitialized { model: &'static str },

    /// Persisted artifact could not be read or decoded
    #[error("failed to load {model} artifact: {reason}")]
    ArtifactLoad { model: &'static str, reason: String },

    /// Synthetic training failed
    #[error("failed to train {model}: {reason}")]
    Training { model: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
