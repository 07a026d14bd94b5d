//! Error types for the cost models

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Market depth must be positive, got {0}")]
    ZeroDepth(f64),

    #[error("Order book has no {0} levels")]
    EmptySide(&'static str),

    #[error("Training set contains a single class")]
    SingleClass,

    #[error("Computation failed: {0}")]
    Computation(String),
}

impl ModelError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ModelError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
