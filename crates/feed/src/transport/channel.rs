//! Tokio channel-based connector for in-process frame sources
//!
//! Each successful `connect` opens a fresh unbounded channel; the sending half
//! is kept by the connector so frames can be pushed into the live connection.

use async_trait::async_trait;
use futures_util::stream;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use super::{Connector, FrameStream};
use crate::error::FeedError;

type FrameSender = mpsc::UnboundedSender<Result<String, FeedError>>;

#[derive(Default)]
struct Shared {
    attempts: AtomicUsize,
    pending_failures: AtomicUsize,
    live: Mutex<Option<FrameSender>>,
}

/// Channel connector. Clones share the same connection state.
#[derive(Clone, Default)]
pub struct ChannelConnector {
    shared: Arc<Shared>,
}

impl ChannelConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `n` connection attempts
    pub fn fail_next(&self, n: usize) {
        self.shared.pending_failures.store(n, Ordering::SeqCst);
    }

    /// Number of `connect` calls so far, failed ones included
    pub fn attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Whether a connection is open and its reader is still alive
    pub fn is_live(&self) -> bool {
        self.shared
            .live
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Push a text frame into the live connection
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), FeedError> {
        self.send(Ok(text.into()))
    }

    /// Fail the live connection with a transport error
    pub fn send_error(&self, error: FeedError) -> Result<(), FeedError> {
        self.send(Err(error))
    }

    /// Close the live connection from the server side
    pub fn disconnect(&self) {
        self.shared.live.lock().take();
    }

    fn send(&self, item: Result<String, FeedError>) -> Result<(), FeedError> {
        let live = self.shared.live.lock();
        let tx = live.as_ref().ok_or(FeedError::Closed)?;
        tx.send(item).map_err(|_| FeedError::Closed)
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self) -> Result<FrameStream, FeedError> {
        self.shared.attempts.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .shared
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(FeedError::Connection("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.live.lock() = Some(tx);

        let frames = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(frames))
    }

    fn endpoint(&self) -> &str {
        "channel://local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_scripted_failures_then_frames() {
        let connector = ChannelConnector::new();
        connector.fail_next(2);

        assert!(connector.connect().await.is_err());
        assert!(connector.connect().await.is_err());
        let mut frames = connector.connect().await.unwrap();
        assert_eq!(connector.attempts(), 3);

        connector.send_text("hello").unwrap();
        assert_eq!(frames.next().await, Some(Ok("hello".to_string())));

        connector.disconnect();
        assert_eq!(frames.next().await, None);
        assert_eq!(connector.send_text("late"), Err(FeedError::Closed));
    }
}
