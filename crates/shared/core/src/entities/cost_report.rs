use serde::{Deserialize, Serialize};

/// Cost estimate for one simulation tick.
///
/// `slippage_pct` and `impact_pct` are fractions of the order size
/// (0.01 = 1%); `maker_pct` and `taker_pct` are percentages summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub slippage_pct: f64,
    pub impact_pct: f64,
    pub fee_amount: f64,
    pub net_cost: f64,
    pub maker_pct: f64,
    pub taker_pct: f64,
    pub latency_ms: f64,
}

impl CostReport {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "Slippage: {:.4}% | Impact: {:.4}% | Fees: {:.4} | Net: {:.4} | Maker/Taker: {:.0}/{:.0} | Latency: {:.3} ms",
            self.slippage_pct * 100.0,
            self.impact_pct * 100.0,
            self.fee_amount,
            self.net_cost,
            self.maker_pct,
            self.taker_pct,
            self.latency_ms
        )
    }
}
