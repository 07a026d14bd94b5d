mod cost_report;
mod fee;
mod order_params;
mod order_type;
mod snapshot;

pub use cost_report::CostReport;
pub use fee::{FeeSchedule, FeeTier};
pub use order_params::OrderParams;
pub use order_type::OrderType;
pub use snapshot::{OrderBookSnapshot, PriceLevel};
