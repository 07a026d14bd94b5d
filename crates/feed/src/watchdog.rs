use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::BookFeed;
use crate::transport::Connector;

/// Periodic supervisor that restarts the retry loop when the feed is down.
///
/// Abort the returned handle to stop it.
pub struct Watchdog;

impl Watchdog {
    pub fn spawn<C: Connector>(feed: Arc<BookFeed<C>>, check_interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                Self::check(&feed);
            }
        })
    }

    fn check<C: Connector>(feed: &Arc<BookFeed<C>>) {
        if feed.is_connected() {
            return;
        }
        if feed.is_connecting() || !feed.should_reconnect() {
            debug!("Book feed down; reconnect already in progress or disabled");
            return;
        }

        warn!("Book feed disconnected or stale, attempting to reconnect...");
        let feed = Arc::clone(feed);
        let interval = feed.config().reconnect_interval();
        tokio::spawn(async move {
            feed.connect_with_retry(interval).await;
        });
    }
}
