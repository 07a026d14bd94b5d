use futures_util::StreamExt;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tcsim_core::OrderBookSnapshot;
use tokio::task::JoinHandle;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::health::{ConnectingGuard, FeedHealth, FeedStats};
use crate::parser::DepthFrameParser;
use crate::subscriber::{SnapshotHandler, SubscriberId, Subscribers};
use crate::transport::{Connector, FrameStream};

/// Result of a [`BookFeed::connect_with_retry`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Connected { attempts: u64 },
    /// Another retry loop already owns the connection attempt
    AlreadyConnecting,
    /// Reconnection was disabled before a connection succeeded
    Stopped,
}

/// Live order book feed.
///
/// Owns one connection at a time and a background receive loop that parses
/// each frame and fans the resulting snapshot out to subscribers. Snapshots
/// are delivered strictly in arrival order; the next frame is not read until
/// every subscriber has seen the current one.
pub struct BookFeed<C: Connector> {
    connector: C,
    config: FeedConfig,
    parser: DepthFrameParser,
    subscribers: Arc<Subscribers>,
    health: Arc<FeedHealth>,
    receive_task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> BookFeed<C> {
    pub fn new(connector: C, config: FeedConfig) -> Self {
        let parser = DepthFrameParser::new(config.depth_levels);
        Self {
            connector,
            config,
            parser,
            subscribers: Arc::new(Subscribers::new()),
            health: Arc::new(FeedHealth::new()),
            receive_task: Mutex::new(None),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Add a subscriber; see [`Subscribers::register`]
    pub fn register(&self, handler: Arc<dyn SnapshotHandler>) -> SubscriberId {
        self.subscribers.register(handler)
    }

    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.subscribers.unregister(id)
    }

    /// Open a connection and start the receive loop.
    ///
    /// Any previous connection is closed first.
    pub async fn connect(&self) -> Result<(), FeedError> {
        self.close().await;

        let frames = match self.connector.connect().await {
            Ok(frames) => frames,
            Err(e) => {
                self.health.mark_closed();
                self.health.record_failed_attempt();
                return Err(e);
            }
        };

        self.health.mark_connected();
        let task = tokio::spawn(run_receive_loop(
            frames,
            self.parser,
            Arc::clone(&self.subscribers),
            Arc::clone(&self.health),
        ));
        *self.receive_task.lock() = Some(task);

        info!("Connected to {}", self.connector.endpoint());
        Ok(())
    }

    /// Connect, retrying every `interval` until it succeeds or reconnection
    /// is stopped. A second concurrent call returns
    /// [`RetryOutcome::AlreadyConnecting`] without dialing.
    pub async fn connect_with_retry(&self, interval: Duration) -> RetryOutcome {
        if !self.health.try_begin_connecting() {
            debug!("Connection attempt already in progress");
            return RetryOutcome::AlreadyConnecting;
        }
        let _guard = ConnectingGuard(&self.health);

        let mut attempts = 0;
        while self.health.should_reconnect() {
            attempts += 1;
            match self.connect().await {
                Ok(()) => return RetryOutcome::Connected { attempts },
                Err(e) => {
                    error!("Connection to {} failed: {}", self.connector.endpoint(), e);
                    info!("Attempting to reconnect in {:?}...", interval);
                    tokio::time::sleep(interval).await;
                }
            }
        }

        info!("Reconnection stopped after {} attempt(s)", attempts);
        RetryOutcome::Stopped
    }

    /// Open and heard from within the staleness window
    pub fn is_connected(&self) -> bool {
        self.health.is_live(self.config.stale_after())
    }

    /// Whether the transport is open, regardless of staleness
    pub fn transport_open(&self) -> bool {
        self.health.transport_open()
    }

    pub fn is_connecting(&self) -> bool {
        self.health.is_connecting()
    }

    pub fn should_reconnect(&self) -> bool {
        self.health.should_reconnect()
    }

    /// Make running and future retry loops give up
    pub fn stop_reconnecting(&self) {
        self.health.set_should_reconnect(false);
    }

    pub fn resume_reconnecting(&self) {
        self.health.set_should_reconnect(true);
    }

    pub fn stats(&self) -> FeedStats {
        self.health.stats()
    }

    /// Cancel the receive loop and drop the connection. No-op when closed.
    pub async fn close(&self) {
        let task = self.receive_task.lock().take();
        if let Some(task) = task {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("Receive loop ended abnormally: {}", e),
            }
            info!("Closed connection to {}", self.connector.endpoint());
        }
        self.health.mark_closed();
    }
}

impl<C: Connector> Drop for BookFeed<C> {
    fn drop(&mut self) {
        if let Some(task) = self.receive_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_receive_loop(
    mut frames: FrameStream,
    parser: DepthFrameParser,
    subscribers: Arc<Subscribers>,
    health: Arc<FeedHealth>,
) {
    while let Some(frame) = frames.next().await {
        let text = match frame {
            Ok(text) => text,
            Err(e) => {
                error!("Receive error: {}", e);
                break;
            }
        };
        health.record_frame();

        let received_at = chrono::Utc::now().timestamp_millis();
        match parser.parse(&text, received_at) {
            Ok(Some(snapshot)) => {
                deliver(&subscribers, snapshot).await;
                health.record_delivery();
            }
            Ok(None) => {}
            Err(e) => {
                health.record_dropped();
                warn!("Dropping malformed frame: {}", e);
            }
        }
    }

    warn!("Book feed stream ended");
    health.mark_closed();
}

async fn deliver(subscribers: &Subscribers, snapshot: OrderBookSnapshot) {
    let delivery = subscribers.dispatch(Arc::new(snapshot)).await;
    if delivery.failed > 0 {
        debug!(
            "Snapshot delivered to {} subscriber(s), {} failed",
            delivery.delivered, delivery.failed
        );
    }
}
