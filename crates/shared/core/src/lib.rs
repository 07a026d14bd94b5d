//! Trade Cost Simulator Core Domain
//!
//! Pure value types shared by the feed, the cost models and the runner.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    CostReport, FeeSchedule, FeeTier, OrderBookSnapshot, OrderParams, OrderType, PriceLevel,
};
pub use error::ConfigurationError;
pub use values::{Price, Quantity, Symbol, Timestamp};
