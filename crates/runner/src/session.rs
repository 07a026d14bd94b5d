use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;
use tcsim_core::{CostReport, OrderBookSnapshot, OrderParams};
use tcsim_feed::{HandlerError, SnapshotHandler};
use tokio::sync::watch;

use crate::aggregator::CostAggregator;
use crate::error::SimulationError;

/// Live costing session.
///
/// Registered as a feed subscriber: every snapshot is costed with the current
/// order parameters and the report is published on a watch channel.
pub struct CostSession {
    aggregator: Arc<CostAggregator>,
    order: RwLock<OrderParams>,
    latest: RwLock<Option<Arc<OrderBookSnapshot>>>,
    reports: watch::Sender<Option<CostReport>>,
}

impl CostSession {
    pub fn new(aggregator: Arc<CostAggregator>, order: OrderParams) -> Result<Self, SimulationError> {
        order.validate()?;
        let (reports, _) = watch::channel(None);
        Ok(Self {
            aggregator,
            order: RwLock::new(order),
            latest: RwLock::new(None),
            reports,
        })
    }

    pub fn aggregator(&self) -> &Arc<CostAggregator> {
        &self.aggregator
    }

    /// Receiver for the most recent report
    pub fn subscribe(&self) -> watch::Receiver<Option<CostReport>> {
        self.reports.subscribe()
    }

    pub fn latest_report(&self) -> Option<CostReport> {
        *self.reports.borrow()
    }

    pub fn latest_snapshot(&self) -> Option<Arc<OrderBookSnapshot>> {
        self.latest.read().clone()
    }

    pub fn order(&self) -> OrderParams {
        self.order.read().clone()
    }

    /// Replace the order being costed. Invalid parameters are rejected and
    /// the previous order is kept.
    pub fn set_order(&self, order: OrderParams) -> Result<(), SimulationError> {
        order.validate()?;
        *self.order.write() = order;
        Ok(())
    }

    /// Re-cost the latest snapshot, e.g. after [`set_order`](Self::set_order).
    ///
    /// Returns `None` before the first snapshot.
    pub fn recompute(&self) -> Option<Result<CostReport, SimulationError>> {
        let snapshot = self.latest_snapshot()?;
        Some(self.cost(&snapshot))
    }

    fn cost(&self, snapshot: &OrderBookSnapshot) -> Result<CostReport, SimulationError> {
        let order = self.order();
        let report = self.aggregator.simulate(&order, snapshot)?;
        self.reports.send_replace(Some(report));
        Ok(report)
    }
}

#[async_trait]
impl SnapshotHandler for CostSession {
    async fn handle(&self, snapshot: Arc<OrderBookSnapshot>) -> Result<(), HandlerError> {
        *self.latest.write() = Some(Arc::clone(&snapshot));
        let report = self
            .cost(&snapshot)
            .map_err(|e| HandlerError::failed(e.to_string()))?;
        debug!("{}", report.summary());
        Ok(())
    }
}
