use serde::{Deserialize, Serialize};
use tcsim_core::{FeeSchedule, OrderParams};
use tcsim_feed::FeedConfig;
use tcsim_models::{AlmgrenChrissParams, OnlineModelConfig};

/// Top-level simulator configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub feed: FeedConfig,

    /// Order costed on every snapshot
    #[serde(default)]
    pub order: OrderParams,

    #[serde(default)]
    pub impact: ImpactConfig,

    #[serde(default)]
    pub models: OnlineModelConfig,

    #[serde(default)]
    pub fees: FeeSchedule,
}

/// Almgren-Chriss parameters plus the execution horizon used per estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactConfig {
    #[serde(flatten)]
    pub params: AlmgrenChrissParams,

    #[serde(default = "default_time_horizon")]
    pub time_horizon: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            params: AlmgrenChrissParams::default(),
            time_horizon: default_time_horizon(),
        }
    }
}

fn default_time_horizon() -> f64 {
    1.0
}
