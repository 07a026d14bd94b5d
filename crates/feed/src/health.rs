//! Connection health bookkeeping shared by the receive loop, the retry loop
//! and the watchdog

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) struct FeedHealth {
    transport_open: AtomicBool,
    /// Set while a retry loop owns the connection attempt
    is_connecting: AtomicBool,
    should_reconnect: AtomicBool,
    last_message: Mutex<Option<Instant>>,
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    snapshots_delivered: AtomicU64,
    connections: AtomicU64,
    failed_attempts: AtomicU64,
}

/// Point-in-time view of the feed counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub snapshots_delivered: u64,
    pub connections: u64,
    pub failed_attempts: u64,
    /// Time since the last inbound frame, if any arrived
    pub since_last_message: Option<Duration>,
}

impl FeedHealth {
    pub(crate) fn new() -> Self {
        Self {
            transport_open: AtomicBool::new(false),
            is_connecting: AtomicBool::new(false),
            should_reconnect: AtomicBool::new(true),
            last_message: Mutex::new(None),
            frames_received: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            snapshots_delivered: AtomicU64::new(0),
            connections: AtomicU64::new(0),
            failed_attempts: AtomicU64::new(0),
        }
    }

    pub(crate) fn mark_connected(&self) {
        *self.last_message.lock() = Some(Instant::now());
        self.transport_open.store(true, Ordering::SeqCst);
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_closed(&self) {
        self.transport_open.store(false, Ordering::SeqCst);
    }

    pub(crate) fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame(&self) {
        *self.last_message.lock() = Some(Instant::now());
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.snapshots_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transport_open(&self) -> bool {
        self.transport_open.load(Ordering::SeqCst)
    }

    pub(crate) fn since_last_message(&self) -> Option<Duration> {
        self.last_message.lock().map(|at| at.elapsed())
    }

    /// Open and heard from less than `stale_after` ago
    pub(crate) fn is_live(&self, stale_after: Duration) -> bool {
        self.transport_open() && self.since_last_message().is_some_and(|d| d < stale_after)
    }

    /// Claim the connecting flag; false if another loop holds it
    pub(crate) fn try_begin_connecting(&self) -> bool {
        self.is_connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn end_connecting(&self) {
        self.is_connecting.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_connecting(&self) -> bool {
        self.is_connecting.load(Ordering::SeqCst)
    }

    pub(crate) fn should_reconnect(&self) -> bool {
        self.should_reconnect.load(Ordering::SeqCst)
    }

    pub(crate) fn set_should_reconnect(&self, value: bool) {
        self.should_reconnect.store(value, Ordering::SeqCst);
    }

    pub(crate) fn stats(&self) -> FeedStats {
        FeedStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            snapshots_delivered: self.snapshots_delivered.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            since_last_message: self.since_last_message(),
        }
    }
}

/// Clears the connecting flag when the retry loop exits, however it exits
pub(crate) struct ConnectingGuard<'a>(pub(crate) &'a FeedHealth);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.end_connecting();
    }
}
