//! Validation errors for domain values

use thiserror::Error;

/// Invalid parameters supplied by the caller.
///
/// These are surfaced as-is and never replaced by a default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Order size must be positive and finite, got {0}")]
    InvalidOrderSize(f64),

    #[error("Volatility must be within [0, 1], got {0}")]
    InvalidVolatility(f64),

    #[error("Fee rate for {tier} must be non-negative and finite, got {rate}")]
    InvalidFeeRate { tier: String, rate: f64 },

    #[error("Invalid price level: price={price}, size={size}")]
    InvalidLevel { price: f64, size: f64 },

    #[error("Order book has no levels on either side")]
    EmptyBook,

    #[error("Unknown fee tier: {0}")]
    UnknownFeeTier(String),
}
