//! Frame transports
//!
//! A [`Connector`] opens one connection and hands back its inbound text frames
//! as a stream. The feed owns reconnection; a connector only knows how to dial.
//!
//! - [`WsConnector`]: WebSocket via tokio-tungstenite
//! - [`ChannelConnector`]: in-process channel, for replay and tests

mod channel;
mod ws;

pub use channel::ChannelConnector;
pub use ws::WsConnector;

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::error::FeedError;

/// Inbound text frames of one live connection. The stream ends when the peer
/// closes; an `Err` item means the transport failed.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, FeedError>> + Send>>;

/// Opens connections to a frame source
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<FrameStream, FeedError>;

    /// Where this connector dials, for logging
    fn endpoint(&self) -> &str;
}
