//! Error types for the feed crate

use thiserror::Error;

/// Transport-level errors (connect or receive)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Connection(e.to_string())
    }
}

/// Malformed inbound frame. The frame is dropped, the feed keeps running.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Expected an array of price levels in '{0}'")]
    NotAnArray(&'static str),

    #[error("Invalid price level {level} in '{side}'")]
    InvalidLevel { side: &'static str, level: String },
}

/// Failure reported by a snapshot subscriber
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Subscriber failed: {0}")]
    Failed(String),

    #[error("Subscriber panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}
