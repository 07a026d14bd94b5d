use std::path::Path;
use tcsim_core::ConfigurationError;
use thiserror::Error;

use super::types::SimulatorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Invalid {section} config: {reason}")]
    Invalid { section: &'static str, reason: String },
}

/// Load and validate simulator configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulatorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load and validate configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<SimulatorConfig, ConfigError> {
    let config: SimulatorConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<SimulatorConfig, ConfigError> {
    let default_config = include_str!("default_config.json");
    load_config_from_str(default_config)
}

impl SimulatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.order.validate()?;
        self.fees.validate()?;

        self.impact
            .params
            .validate()
            .map_err(|e| invalid("impact", e.to_string()))?;
        let horizon = self.impact.time_horizon;
        if !horizon.is_finite() || horizon < 0.0 {
            return Err(invalid("impact", format!("time_horizon must be non-negative, got {}", horizon)));
        }

        if self.models.min_samples == 0 {
            return Err(invalid("models", "min_samples must be at least 1".into()));
        }
        if self.models.retention < self.models.min_samples {
            return Err(invalid(
                "models",
                format!(
                    "retention ({}) must be at least min_samples ({})",
                    self.models.retention, self.models.min_samples
                ),
            ));
        }

        if self.feed.url.trim().is_empty() {
            return Err(invalid("feed", "url is empty".into()));
        }
        if self.feed.depth_levels == 0 {
            return Err(invalid("feed", "depth_levels must be at least 1".into()));
        }
        if self.feed.reconnect_interval_ms == 0 || self.feed.watchdog_interval_ms == 0 {
            return Err(invalid("feed", "intervals must be positive".into()));
        }
        Ok(())
    }
}

fn invalid(section: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { section, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcsim_core::{FeeTier, OrderType};

    #[test]
    fn test_load_default_config() {
        let config = load_default_config().unwrap();
        assert_eq!(config.feed.url, tcsim_feed::DEFAULT_FEED_URL);
        assert_eq!(config.order.exchange, "OKX");
        assert_eq!(config.order.symbol, "BTC-USDT-SWAP");
        assert_eq!(config.order.quantity, 100.0);
        assert_eq!(config.impact.time_horizon, 1.0);
        assert_eq!(config.models.min_samples, 10);
        assert_eq!(config.fees.rate(FeeTier::Tier3Standard), 0.0006);
    }

    #[test]
    fn test_empty_json_is_all_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let json = r#"{
            "order": {"quantity": 25.0, "order_type": "limit", "fee_tier": "tier2_pro"},
            "impact": {"volatility": 0.04, "time_horizon": 2.0},
            "fees": {"rates": {"tier2_pro": 0.0009}}
        }"#;
        let config = load_config_from_str(json).unwrap();
        assert_eq!(config.order.quantity, 25.0);
        assert_eq!(config.order.order_type, OrderType::Limit);
        assert_eq!(config.order.volatility, 0.02);
        assert_eq!(config.impact.params.volatility, 0.04);
        assert_eq!(config.impact.params.risk_aversion, 0.1);
        assert_eq!(config.impact.time_horizon, 2.0);
        assert_eq!(config.fees.rate(FeeTier::Tier2Pro), 0.0009);
        assert_eq!(config.fees.rate(FeeTier::Tier1Vip), 0.001);
    }

    #[test]
    fn test_empty_fee_section_uses_default_rates() {
        let config = load_config_from_str(r#"{"fees": {}}"#).unwrap();
        assert_eq!(config.fees.rate(FeeTier::Tier1Vip), 0.001);
        assert_eq!(config.fees.rate(FeeTier::Tier2Pro), 0.0008);
        assert_eq!(config.fees.rate(FeeTier::Tier3Standard), 0.0006);
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            load_config_from_str(r#"{"order": {"quantity": 0.0}}"#),
            Err(ConfigError::Configuration(ConfigurationError::InvalidOrderSize(_)))
        ));
        assert!(matches!(
            load_config_from_str(r#"{"impact": {"temporary_impact": -0.1}}"#),
            Err(ConfigError::Invalid { section: "impact", .. })
        ));
        assert!(matches!(
            load_config_from_str(r#"{"models": {"min_samples": 20, "retention": 5}}"#),
            Err(ConfigError::Invalid { section: "models", .. })
        ));
        assert!(matches!(
            load_config_from_str(r#"{"fees": {"rates": {"tier1_vip": -1.0}}}"#),
            Err(ConfigError::Configuration(_))
        ));
        assert!(matches!(
            load_config_from_str("{not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/tcsim.json"),
            Err(ConfigError::IoError(_))
        ));
    }
}
