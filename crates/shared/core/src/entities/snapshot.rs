use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::values::{Price, Quantity};

/// A single price level: `[price, size]` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct PriceLevel {
    pub price: Price,
    pub size: Quantity,
}

impl PriceLevel {
    /// Create a level, rejecting negative or non-finite values
    pub fn new(price: Price, size: Quantity) -> Result<Self, ConfigurationError> {
        if !price.is_finite() || !size.is_finite() || price < 0.0 || size < 0.0 {
            return Err(ConfigurationError::InvalidLevel { price, size });
        }
        Ok(Self { price, size })
    }
}

impl TryFrom<[f64; 2]> for PriceLevel {
    type Error = ConfigurationError;

    fn try_from([price, size]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(price, size)
    }
}

impl From<PriceLevel> for [f64; 2] {
    fn from(level: PriceLevel) -> Self {
        [level.price, level.size]
    }
}

/// Full view of the book at one instant.
///
/// Each snapshot replaces the previous one; nothing is merged. Bids are kept
/// in descending price order and asks in ascending price order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    /// Receive time, epoch milliseconds
    pub timestamp: i64,
}

/// Unchecked wire shape, validated through [`OrderBookSnapshot::new`]
#[derive(Deserialize)]
struct RawSnapshot {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    timestamp: i64,
}

impl TryFrom<RawSnapshot> for OrderBookSnapshot {
    type Error = ConfigurationError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        Self::new(raw.bids, raw.asks, raw.timestamp).ok_or(ConfigurationError::EmptyBook)
    }
}

impl OrderBookSnapshot {
    /// Build a snapshot, sorting both sides into book order.
    ///
    /// Returns `None` when both sides are empty.
    pub fn new(
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
        timestamp: i64,
    ) -> Option<Self> {
        if bids.is_empty() && asks.is_empty() {
            return None;
        }
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        Some(Self {
            bids,
            asks,
            timestamp,
        })
    }

    /// Build from `[price, size]` pairs (test and fixture helper).
    ///
    /// Returns `None` if any pair is not a valid level.
    pub fn from_pairs(bids: &[[f64; 2]], asks: &[[f64; 2]], timestamp: i64) -> Option<Self> {
        let levels = |pairs: &[[f64; 2]]| {
            pairs
                .iter()
                .map(|pair| PriceLevel::try_from(*pair).ok())
                .collect::<Option<Vec<_>>>()
        };
        Self::new(levels(bids)?, levels(asks)?, timestamp)
    }

    /// Keep only the best `levels` on each side
    pub fn truncated(mut self, levels: usize) -> Self {
        self.bids.truncate(levels);
        self.asks.truncate(levels);
        self
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Best ask minus best bid, if both sides are present
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Mid price, if both sides are present
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    /// Sum of sizes over the top `levels` of both sides
    pub fn depth(&self, levels: usize) -> Quantity {
        let bid_depth: Quantity = self.bids.iter().take(levels).map(|l| l.size).sum();
        let ask_depth: Quantity = self.asks.iter().take(levels).map(|l| l.size).sum();
        bid_depth + ask_depth
    }

    /// Receive time as a UTC datetime
    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrderBookSnapshot {
        OrderBookSnapshot::from_pairs(
            &[[99.0, 3.0], [100.0, 2.0]],
            &[[102.0, 4.0], [101.0, 1.0]],
            1_700_000_000_000,
        )
        .unwrap()
    }

    #[test]
    fn test_sides_are_sorted() {
        let book = sample();
        assert_eq!(book.best_bid().unwrap().price, 100.0);
        assert_eq!(book.best_ask().unwrap().price, 101.0);
        assert_eq!(book.bids[1].price, 99.0);
        assert_eq!(book.asks[1].price, 102.0);
    }

    #[test]
    fn test_spread_mid_depth() {
        let book = sample();
        assert_eq!(book.spread(), Some(1.0));
        assert_eq!(book.mid_price(), Some(100.5));
        assert_eq!(book.depth(5), 10.0);
        assert_eq!(book.depth(1), 3.0);
    }

    #[test]
    fn test_empty_book_rejected() {
        assert!(OrderBookSnapshot::from_pairs(&[], &[], 0).is_none());
        let one_sided = OrderBookSnapshot::from_pairs(&[[100.0, 1.0]], &[], 0).unwrap();
        assert_eq!(one_sided.spread(), None);
    }

    #[test]
    fn test_invalid_level() {
        assert!(PriceLevel::new(-1.0, 1.0).is_err());
        assert!(PriceLevel::new(1.0, f64::NAN).is_err());
        assert!(PriceLevel::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn test_wire_shape() {
        let book = sample().truncated(1);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["bids"], serde_json::json!([[100.0, 2.0]]));
        assert_eq!(json["asks"], serde_json::json!([[101.0, 1.0]]));
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_deserialize_restores_book_order() {
        let book: OrderBookSnapshot = serde_json::from_str(
            r#"{"bids":[[99,3],[100,2]],"asks":[[102,4],[101,1]],"timestamp":0}"#,
        )
        .unwrap();
        assert_eq!(book.best_bid().unwrap().price, 100.0);
        assert_eq!(book.best_ask().unwrap().price, 101.0);
    }

    #[test]
    fn test_deserialize_rejects_invalid_books() {
        let negative = serde_json::from_str::<OrderBookSnapshot>(
            r#"{"bids":[[99,3],[100,2]],"asks":[[102,4],[-101,1]],"timestamp":0}"#,
        );
        assert!(negative.is_err());

        let empty =
            serde_json::from_str::<OrderBookSnapshot>(r#"{"bids":[],"asks":[],"timestamp":0}"#);
        assert!(empty.is_err());

        assert!(serde_json::from_str::<PriceLevel>("[100.0, -1.0]").is_err());
        assert!(OrderBookSnapshot::from_pairs(&[[100.0, 1.0]], &[[-1.0, 1.0]], 0).is_none());
    }
}
