//! Simulator configuration
//!
//! JSON file with `feed`, `order`, `impact`, `models` and `fees` sections.
//! Every field has a default, so `{}` is a valid configuration.

mod loader;
mod types;

pub use loader::{ConfigError, load_config, load_config_from_str, load_default_config};
pub use types::{ImpactConfig, SimulatorConfig};
