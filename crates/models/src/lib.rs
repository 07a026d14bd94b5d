//! Cost models
//!
//! - [`features`]: snapshot + order → normalized model inputs
//! - [`AlmgrenChrissModel`]: closed-form market impact and execution schedule
//! - [`SlippageEstimator`]: online least-squares slippage regressor
//! - [`MakerTakerEstimator`]: online logistic maker/taker classifier
//!
//! Failure policy differs per model: impact estimates return errors to the
//! caller, while the two online estimators fall back (heuristic slippage,
//! last known maker probability).

pub mod error;
pub mod features;
pub mod history;
pub mod impact;
pub mod maker_taker;
pub mod metrics;
pub mod regression;
pub mod slippage;

pub use error::{ModelError, Result};
pub use features::{BookFeatures, derive_features};
pub use history::{OnlineModelConfig, TrainingHistory, TrainingSample};
pub use impact::{AlmgrenChrissModel, AlmgrenChrissParams, ExecutionTrajectory, ImpactParamsUpdate};
pub use maker_taker::{MakerTakerEstimator, NEUTRAL_PROBABILITY};
pub use metrics::ModelMetrics;
pub use slippage::SlippageEstimator;
