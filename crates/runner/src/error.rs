use tcsim_core::ConfigurationError;
use tcsim_models::ModelError;
use thiserror::Error;

/// Why a simulation produced no report.
///
/// Model failures never end up here; they fall back inside the aggregator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid order parameters: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Unusable order book: {0}")]
    InvalidInput(#[from] ModelError),
}
