//! Snapshot subscribers and their fan-out
//!
//! Subscribers are invoked in registration order, one after the other, for
//! every snapshot. A subscriber that errors or panics is logged and skipped;
//! delivery to the rest continues.

use async_trait::async_trait;
use futures_util::FutureExt;
use log::error;
use parking_lot::RwLock;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tcsim_core::OrderBookSnapshot;

use crate::error::HandlerError;

/// Receives every normalized snapshot
#[async_trait]
pub trait SnapshotHandler: Send + Sync {
    async fn handle(&self, snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError>;
}

/// Synchronous subscriber, run on the blocking pool so it cannot stall the
/// receive loop's worker thread
pub struct BlockingHandler<F> {
    f: Arc<F>,
}

impl<F> BlockingHandler<F>
where
    F: Fn(&OrderBookSnapshot) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl<F> SnapshotHandler for BlockingHandler<F>
where
    F: Fn(&OrderBookSnapshot) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    async fn handle(&self, snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError> {
        let f = Arc::clone(&self.f);
        tokio::task::spawn_blocking(move || f(snapshot.as_ref()))
            .await
            .map_err(|e| HandlerError::Panicked(e.to_string()))?
    }
}

/// Asynchronous subscriber, awaited directly on the receive loop
pub struct AsyncHandler<F> {
    f: F,
}

impl<F, Fut> AsyncHandler<F>
where
    F: Fn(Arc<OrderBookSnapshot>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> SnapshotHandler for AsyncHandler<F>
where
    F: Fn(Arc<OrderBookSnapshot>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError> {
        (self.f)(snapshot).await
    }
}

/// Handle returned by registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Outcome of delivering one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered subscriber registry
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    entries: RwLock<Vec<(SubscriberId, Arc<dyn SnapshotHandler>)>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Registering the same `Arc` twice returns the
    /// existing id and leaves a single entry.
    pub fn register(&self, handler: Arc<dyn SnapshotHandler>) -> SubscriberId {
        let mut entries = self.entries.write();
        if let Some((id, _)) = entries.iter().find(|(_, h)| Arc::ptr_eq(h, &handler)) {
            return *id;
        }
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        entries.push((id, handler));
        id
    }

    /// Remove a subscriber; returns false for unknown ids
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Deliver a snapshot to every subscriber, in registration order
    pub async fn dispatch(&self, snapshot: Arc<OrderBookSnapshot>) -> Delivery {
        // Snapshot the list so registration never waits on a slow subscriber
        let handlers: Vec<(SubscriberId, Arc<dyn SnapshotHandler>)> = self.entries.read().clone();
        let mut delivery = Delivery::default();

        for (id, handler) in handlers {
            let outcome = AssertUnwindSafe(handler.handle(Arc::clone(&snapshot)))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    error!("Subscriber {:?} failed: {}", id, e);
                    delivery.failed += 1;
                }
                Err(panic) => {
                    error!("Subscriber {:?} panicked: {}", id, panic_message(&*panic));
                    delivery.failed += 1;
                }
            }
        }

        delivery
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn book() -> Arc<OrderBookSnapshot> {
        Arc::new(OrderBookSnapshot::from_pairs(&[[100.0, 1.0]], &[[101.0, 1.0]], 0).unwrap())
    }

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl SnapshotHandler for Recorder {
        async fn handle(&self, _snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError> {
            self.log.lock().push(self.name);
            Ok(())
        }
    }

    struct Panicker;

    #[async_trait]
    impl SnapshotHandler for Panicker {
        async fn handle(&self, _snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError> {
            panic!("subscriber bug");
        }
    }

    #[tokio::test]
    async fn test_registration_order_and_isolation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscribers = Subscribers::new();

        subscribers.register(Arc::new(Recorder { name: "first", log: log.clone() }));
        subscribers.register(Arc::new(Panicker));
        subscribers.register(Arc::new(AsyncHandler::new(|_snapshot| async {
            Err(HandlerError::failed("boom"))
        })));
        subscribers.register(Arc::new(Recorder { name: "last", log: log.clone() }));

        let delivery = subscribers.dispatch(book()).await;
        assert_eq!(delivery, Delivery { delivered: 2, failed: 2 });
        assert_eq!(*log.lock(), vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_and_unregister() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscribers = Subscribers::new();
        let handler: Arc<dyn SnapshotHandler> = Arc::new(Recorder { name: "only", log: log.clone() });

        let id = subscribers.register(handler.clone());
        assert_eq!(subscribers.register(handler), id);
        assert_eq!(subscribers.len(), 1);

        subscribers.dispatch(book()).await;
        assert_eq!(log.lock().len(), 1);

        assert!(subscribers.unregister(id));
        assert!(!subscribers.unregister(id));
        assert!(subscribers.is_empty());
    }

    #[tokio::test]
    async fn test_blocking_handler_runs_off_loop() {
        let seen = Arc::new(Mutex::new(0.0));
        let sink = seen.clone();
        let subscribers = Subscribers::new();
        subscribers.register(Arc::new(BlockingHandler::new(move |book: &OrderBookSnapshot| {
            *sink.lock() = book.depth(5);
            Ok(())
        })));

        let delivery = subscribers.dispatch(book()).await;
        assert_eq!(delivery.delivered, 1);
        assert_eq!(*seen.lock(), 2.0);
    }
}
