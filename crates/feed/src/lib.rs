//! Order book feed
//!
//! ```text
//! Connector ──frames──► receive loop ──parse──► OrderBookSnapshot ──► subscribers
//!     ▲                      │
//!     └── connect_with_retry ◄── Watchdog (is_connected? no → retry)
//! ```
//!
//! - [`BookFeed`]: connection lifecycle, receive loop, fan-out
//! - [`Watchdog`]: periodic liveness check and recovery
//! - [`DepthFrameParser`]: frame normalization
//! - [`transport`]: WebSocket and in-process connectors

pub mod client;
pub mod config;
pub mod error;
mod health;
pub mod parser;
pub mod subscriber;
pub mod transport;
pub mod watchdog;

pub use client::{BookFeed, RetryOutcome};
pub use config::{DEFAULT_FEED_URL, FeedConfig};
pub use error::{FeedError, HandlerError, ParseError};
pub use health::FeedStats;
pub use parser::DepthFrameParser;
pub use subscriber::{AsyncHandler, BlockingHandler, Delivery, SnapshotHandler, SubscriberId, Subscribers};
pub use transport::{ChannelConnector, Connector, FrameStream, WsConnector};
pub use watchdog::Watchdog;
