use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public Binance depth stream for BTC/USDT
pub const DEFAULT_FEED_URL: &str = "wss://stream.binance.com:9443/ws/btcusdt@depth";

/// Book feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Delay between failed connection attempts
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// A connection with no frame for longer than this is considered down
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,

    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,

    /// Levels kept per side when normalizing a frame
    #[serde(default = "default_depth_levels")]
    pub depth_levels: usize,
}

impl FeedConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            stale_after_ms: default_stale_after_ms(),
            watchdog_interval_ms: default_watchdog_interval_ms(),
            depth_levels: default_depth_levels(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_reconnect_interval_ms() -> u64 {
    5_000
}

fn default_stale_after_ms() -> u64 {
    30_000
}

fn default_watchdog_interval_ms() -> u64 {
    15_000
}

fn default_depth_levels() -> usize {
    20
}
