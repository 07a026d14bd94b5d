use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type of the simulated trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at specified price or better
    Limit,
    /// Market order triggered when price reaches stop price
    Stop,
    /// Limit order triggered when price reaches a profit target
    TakeProfit,
}

impl Default for OrderType {
    fn default() -> Self {
        Self::Market
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
            OrderType::Stop => "Stop",
            OrderType::TakeProfit => "Take Profit",
        };
        f.write_str(name)
    }
}
