use serde::{Deserialize, Serialize};

use super::fee::FeeTier;
use super::order_type::OrderType;
use crate::error::ConfigurationError;
use crate::values::{Quantity, Symbol};

/// Parameters of the hypothetical trade being costed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderParams {
    /// Exchange name (informational)
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Asset symbol (informational)
    #[serde(default = "default_symbol")]
    pub symbol: Symbol,
    #[serde(default)]
    pub order_type: OrderType,
    /// Order size, must be positive
    #[serde(default = "default_quantity")]
    pub quantity: Quantity,
    /// Volatility in [0, 1]
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default)]
    pub fee_tier: FeeTier,
}

impl OrderParams {
    /// Create parameters with the given size and volatility
    pub fn new(quantity: Quantity, volatility: f64) -> Self {
        Self {
            quantity,
            volatility,
            ..Default::default()
        }
    }

    /// Builder: set exchange and symbol
    pub fn with_market(mut self, exchange: impl Into<String>, symbol: impl Into<Symbol>) -> Self {
        self.exchange = exchange.into();
        self.symbol = symbol.into();
        self
    }

    /// Builder: set order type
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Builder: set fee tier
    pub fn with_fee_tier(mut self, fee_tier: FeeTier) -> Self {
        self.fee_tier = fee_tier;
        self
    }

    /// Reject non-positive sizes and out-of-range volatility
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ConfigurationError::InvalidOrderSize(self.quantity));
        }
        if !self.volatility.is_finite() || !(0.0..=1.0).contains(&self.volatility) {
            return Err(ConfigurationError::InvalidVolatility(self.volatility));
        }
        Ok(())
    }
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            symbol: default_symbol(),
            order_type: OrderType::default(),
            quantity: default_quantity(),
            volatility: default_volatility(),
            fee_tier: FeeTier::default(),
        }
    }
}

fn default_exchange() -> String {
    "OKX".to_string()
}

fn default_symbol() -> Symbol {
    "BTC-USDT-SWAP".to_string()
}

fn default_quantity() -> Quantity {
    100.0
}

fn default_volatility() -> f64 {
    0.02
}
