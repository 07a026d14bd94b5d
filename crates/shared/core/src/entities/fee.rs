use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Account fee tier selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTier {
    /// Tier 1 (VIP)
    Tier1Vip,
    /// Tier 2 (Pro)
    Tier2Pro,
    /// Tier 3 (Standard)
    Tier3Standard,
}

impl FeeTier {
    pub const ALL: [FeeTier; 3] = [FeeTier::Tier1Vip, FeeTier::Tier2Pro, FeeTier::Tier3Standard];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            FeeTier::Tier1Vip => "Tier 1 (VIP)",
            FeeTier::Tier2Pro => "Tier 2 (Pro)",
            FeeTier::Tier3Standard => "Tier 3 (Standard)",
        }
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        Self::Tier1Vip
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeeTier {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "tier1_vip" | "tier 1 (vip)" | "vip" | "tier1" => Ok(FeeTier::Tier1Vip),
            "tier2_pro" | "tier 2 (pro)" | "pro" | "tier2" => Ok(FeeTier::Tier2Pro),
            "tier3_standard" | "tier 3 (standard)" | "standard" | "tier3" => {
                Ok(FeeTier::Tier3Standard)
            }
            _ => Err(ConfigurationError::UnknownFeeTier(s.to_string())),
        }
    }
}

/// Flat fee-rate table keyed by tier.
///
/// The fee is `order_size × rate`; there is no model behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default)]
    rates: BTreeMap<FeeTier, f64>,
}

impl FeeSchedule {
    /// Create a schedule from explicit rates
    pub fn new(rates: BTreeMap<FeeTier, f64>) -> Result<Self, ConfigurationError> {
        let schedule = Self { rates };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Override the rate for one tier
    pub fn with_rate(mut self, tier: FeeTier, rate: f64) -> Result<Self, ConfigurationError> {
        self.rates.insert(tier, rate);
        self.validate()?;
        Ok(self)
    }

    /// Fee rate for a tier, falling back to the default table
    pub fn rate(&self, tier: FeeTier) -> f64 {
        self.rates
            .get(&tier)
            .copied()
            .unwrap_or_else(|| default_rate(tier))
    }

    /// Fee charged for an order of `order_size`
    pub fn fee_for(&self, tier: FeeTier, order_size: f64) -> f64 {
        order_size * self.rate(tier)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (tier, rate) in &self.rates {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(ConfigurationError::InvalidFeeRate {
                    tier: tier.to_string(),
                    rate: *rate,
                });
            }
        }
        Ok(())
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            rates: FeeTier::ALL
                .iter()
                .map(|tier| (*tier, default_rate(*tier)))
                .collect(),
        }
    }
}

fn default_rate(tier: FeeTier) -> f64 {
    match tier {
        FeeTier::Tier1Vip => 0.001,
        FeeTier::Tier2Pro => 0.0008,
        FeeTier::Tier3Standard => 0.0006,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_schedule_default() {
        let schedule = FeeSchedule::default();
        assert_eq!(schedule.rate(FeeTier::Tier1Vip), 0.001);
        assert_eq!(schedule.rate(FeeTier::Tier2Pro), 0.0008);
        assert_eq!(schedule.rate(FeeTier::Tier3Standard), 0.0006);
    }

    #[test]
    fn test_fee_for_order() {
        let schedule = FeeSchedule::default();
        let fee = schedule.fee_for(FeeTier::Tier2Pro, 100.0);
        assert!((fee - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_override_and_validation() {
        let schedule = FeeSchedule::default()
            .with_rate(FeeTier::Tier3Standard, 0.002)
            .unwrap();
        assert_eq!(schedule.rate(FeeTier::Tier3Standard), 0.002);

        assert!(FeeSchedule::default().with_rate(FeeTier::Tier1Vip, -0.1).is_err());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Tier 1 (VIP)".parse::<FeeTier>().unwrap(), FeeTier::Tier1Vip);
        assert_eq!("tier2_pro".parse::<FeeTier>().unwrap(), FeeTier::Tier2Pro);
        assert_eq!("Standard".parse::<FeeTier>().unwrap(), FeeTier::Tier3Standard);
        assert!("platinum".parse::<FeeTier>().is_err());
    }

    #[test]
    fn test_missing_tier_uses_default_rate() {
        let schedule = FeeSchedule::new(BTreeMap::new()).unwrap();
        assert_eq!(schedule.rate(FeeTier::Tier2Pro), 0.0008);
    }
}
