//! Feature derivation
//!
//! Turns a book snapshot plus order parameters into the normalized inputs the
//! models consume:
//!
//! ```text
//! depth        = Σ size over top-5 bids + top-5 asks
//! size/depth   = order_size / depth
//! log_depth    = ln(1 + depth)
//! spread       = best_ask - best_bid
//! time_of_day  = seconds since UTC midnight / 86400   ∈ [0, 1)
//! ```

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use tcsim_core::OrderBookSnapshot;

use crate::error::{ModelError, Result};

/// Levels per side summed into market depth
pub const DEPTH_LEVELS: usize = 5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Slippage regressor inputs, in coefficient order
pub const SLIPPAGE_FEATURES: [&str; 4] = ["order_size", "market_depth", "volatility", "time_of_day"];

/// Maker/taker classifier inputs, in coefficient order
pub const MAKER_TAKER_FEATURES: [&str; 5] = [
    "order_size",
    "market_depth",
    "spread",
    "time_of_day",
    "volatility",
];

/// Raw book measurements for one estimation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BookFeatures {
    pub order_size: f64,
    pub depth: f64,
    pub spread: f64,
    pub volatility: f64,
    pub timestamp: DateTime<Utc>,
    pub time_of_day: f64,
}

impl BookFeatures {
    /// `order_size / depth`
    pub fn size_to_depth(&self) -> f64 {
        self.order_size / self.depth
    }

    pub fn log_depth(&self) -> f64 {
        self.depth.ln_1p()
    }

    pub fn slippage_vector(&self) -> [f64; 4] {
        [self.size_to_depth(), self.log_depth(), self.volatility, self.time_of_day]
    }

    pub fn maker_taker_vector(&self) -> [f64; 5] {
        [
            self.size_to_depth(),
            self.log_depth(),
            self.spread / self.depth,
            self.time_of_day,
            self.volatility,
        ]
    }
}

/// Derive features from a snapshot.
///
/// Both book sides must be present (the spread needs them) and the summed
/// depth must be positive.
pub fn derive_features(
    order_size: f64,
    snapshot: &OrderBookSnapshot,
    volatility: f64,
    timestamp: DateTime<Utc>,
) -> Result<BookFeatures> {
    let best_bid = snapshot.best_bid().ok_or(ModelError::EmptySide("bid"))?;
    let best_ask = snapshot.best_ask().ok_or(ModelError::EmptySide("ask"))?;
    let spread = best_ask.price - best_bid.price;
    let depth = snapshot.depth(DEPTH_LEVELS);

    check_order(order_size, depth, volatility)?;
    if !spread.is_finite() {
        return Err(ModelError::invalid(format!("spread is not finite: {}", spread)));
    }

    Ok(BookFeatures {
        order_size,
        depth,
        spread,
        volatility,
        timestamp,
        time_of_day: time_of_day(timestamp),
    })
}

/// Slippage inputs from raw values
pub fn slippage_features(
    order_size: f64,
    depth: f64,
    volatility: f64,
    timestamp: DateTime<Utc>,
) -> Result<[f64; 4]> {
    check_order(order_size, depth, volatility)?;
    Ok([
        order_size / depth,
        depth.ln_1p(),
        volatility,
        time_of_day(timestamp),
    ])
}

/// Maker/taker inputs from raw values
pub fn maker_taker_features(
    order_size: f64,
    depth: f64,
    spread: f64,
    timestamp: DateTime<Utc>,
    volatility: f64,
) -> Result<[f64; 5]> {
    check_order(order_size, depth, volatility)?;
    if !spread.is_finite() {
        return Err(ModelError::invalid(format!("spread is not finite: {}", spread)));
    }
    Ok([
        order_size / depth,
        depth.ln_1p(),
        spread / depth,
        time_of_day(timestamp),
        volatility,
    ])
}

/// Fraction of the UTC day elapsed, in [0, 1)
pub fn time_of_day(timestamp: DateTime<Utc>) -> f64 {
    timestamp.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY
}

fn check_order(order_size: f64, depth: f64, volatility: f64) -> Result<()> {
    if !order_size.is_finite() || order_size < 0.0 {
        return Err(ModelError::invalid(format!("order size {}", order_size)));
    }
    if !depth.is_finite() || depth <= 0.0 {
        return Err(ModelError::ZeroDepth(depth));
    }
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(ModelError::invalid(format!("volatility {}", volatility)));
    }
    Ok(())
}
