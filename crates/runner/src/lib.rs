//! Trade cost simulator
//!
//! Wires the book feed to the cost models:
//!
//! ```text
//! BookFeed ──snapshot──► CostSession ──► CostAggregator ──► CostReport (watch channel)
//!                                           │
//!                     ┌─────────────────────┼──────────────────────┐
//!                     ▼                     ▼                      ▼
//!              Almgren-Chriss       SlippageEstimator     MakerTakerEstimator
//!                                      + FeeSchedule
//! ```
//!
//! - [`CostAggregator`]: one report per request, per-model fallbacks
//! - [`CostSession`]: feed subscriber publishing live reports
//! - [`config`]: JSON configuration with embedded defaults

pub mod aggregator;
pub mod config;
pub mod error;
pub mod session;

pub use aggregator::{AggregatorMetrics, CostAggregator};
pub use config::{ConfigError, SimulatorConfig};
pub use error::SimulationError;
pub use session::CostSession;
