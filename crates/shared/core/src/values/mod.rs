use chrono::{DateTime, Utc};

/// Price value in quote currency
pub type Price = f64;

/// Quantity value in base units
pub type Quantity = f64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a tradeable instrument
pub type Symbol = String;
