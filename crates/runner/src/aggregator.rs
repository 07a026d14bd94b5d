//! Cost aggregation
//!
//! Derives features once per request, queries the three models and the fee
//! table, and assembles a [`CostReport`]:
//!
//! ```text
//! net_cost = size · (1 + slippage + impact) + fee
//! ```

use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::time::Instant;
use tcsim_core::{CostReport, FeeSchedule, OrderBookSnapshot, OrderParams};
use tcsim_models::{
    AlmgrenChrissModel, BookFeatures, ExecutionTrajectory, ImpactParamsUpdate, MakerTakerEstimator,
    ModelError, ModelMetrics, OnlineModelConfig, SlippageEstimator, derive_features,
};

use crate::config::SimulatorConfig;
use crate::error::SimulationError;

/// Metrics of both online estimators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorMetrics {
    pub slippage: ModelMetrics,
    pub maker_taker: ModelMetrics,
}

/// Combines impact, slippage, maker/taker and fees into one report.
///
/// Each model sits behind its own lock so an update to one never blocks a
/// query of another; each append-then-refit happens under a single lock hold.
pub struct CostAggregator {
    impact: RwLock<AlmgrenChrissModel>,
    slippage: Mutex<SlippageEstimator>,
    maker_taker: Mutex<MakerTakerEstimator>,
    fees: FeeSchedule,
    time_horizon: f64,
}

impl CostAggregator {
    pub fn new(
        impact: AlmgrenChrissModel,
        models: OnlineModelConfig,
        fees: FeeSchedule,
        time_horizon: f64,
    ) -> Self {
        Self {
            impact: RwLock::new(impact),
            slippage: Mutex::new(SlippageEstimator::new(models)),
            maker_taker: Mutex::new(MakerTakerEstimator::new(models)),
            fees,
            time_horizon,
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Result<Self, SimulationError> {
        let impact = AlmgrenChrissModel::new(config.impact.params)?;
        Ok(Self::new(
            impact,
            config.models,
            config.fees.clone(),
            config.impact.time_horizon,
        ))
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn time_horizon(&self) -> f64 {
        self.time_horizon
    }

    /// Cost report for `order` against `snapshot`, with time of day taken
    /// from the snapshot's receive time
    pub fn simulate(
        &self,
        order: &OrderParams,
        snapshot: &OrderBookSnapshot,
    ) -> Result<CostReport, SimulationError> {
        self.simulate_at(order, snapshot, snapshot.time())
    }

    /// Cost report with an explicit time of day.
    ///
    /// Fails only for invalid order parameters or a book that cannot yield
    /// features (one side empty, no depth). Model failures fall back to that
    /// model's own default and are logged.
    pub fn simulate_at(
        &self,
        order: &OrderParams,
        snapshot: &OrderBookSnapshot,
        now: DateTime<Utc>,
    ) -> Result<CostReport, SimulationError> {
        let started = Instant::now();

        order.validate()?;
        let features = derive_features(order.quantity, snapshot, order.volatility, now)?;

        let impact_pct = self.estimate_impact(&features);
        let slippage_pct = self.estimate_slippage(&features);
        let maker_probability = self
            .maker_taker
            .lock()
            .predict_maker_probability(
                features.order_size,
                features.depth,
                features.spread,
                now,
                features.volatility,
            )
            .clamp(0.0, 1.0);

        let fee_amount = self.fees.fee_for(order.fee_tier, order.quantity);
        let net_cost = order.quantity * (1.0 + slippage_pct + impact_pct) + fee_amount;

        Ok(CostReport {
            slippage_pct,
            impact_pct,
            fee_amount,
            net_cost,
            maker_pct: maker_probability * 100.0,
            taker_pct: (1.0 - maker_probability) * 100.0,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn estimate_impact(&self, features: &BookFeatures) -> f64 {
        let model = self.impact.read();
        match model.estimate_market_impact(features.order_size, features.depth, self.time_horizon) {
            Ok(impact) => impact,
            Err(e) => {
                warn!("Impact estimate failed, using risk term: {}", e);
                model.risk_term(self.time_horizon)
            }
        }
    }

    fn estimate_slippage(&self, features: &BookFeatures) -> f64 {
        let estimate = self.slippage.lock().estimate_slippage(
            features.order_size,
            features.depth,
            features.volatility,
            features.timestamp,
        );
        match estimate {
            Ok(slippage) => slippage,
            Err(e) => {
                warn!("Slippage estimate failed, using heuristic: {}", e);
                SlippageEstimator::heuristic(features.order_size, features.depth, features.volatility)
            }
        }
    }

    /// Change impact parameters at runtime
    pub fn update_impact_params(&self, update: ImpactParamsUpdate) -> Result<(), ModelError> {
        self.impact.write().update_parameters(update)
    }

    /// Optimal liquidation schedule for `order`, starting from the book's mid price
    pub fn optimal_execution(
        &self,
        order: &OrderParams,
        snapshot: &OrderBookSnapshot,
        steps: usize,
    ) -> Result<ExecutionTrajectory, SimulationError> {
        order.validate()?;
        let mid = snapshot
            .mid_price()
            .ok_or(ModelError::EmptySide(if snapshot.bids.is_empty() { "bid" } else { "ask" }))?;
        let trajectory = self.impact.read().calculate_optimal_execution(
            order.quantity,
            self.time_horizon,
            mid,
            steps,
        )?;
        Ok(trajectory)
    }

    /// Feed an observed slippage back into the regressor
    pub fn record_slippage(
        &self,
        order: &OrderParams,
        snapshot: &OrderBookSnapshot,
        observed_slippage: f64,
        at: DateTime<Utc>,
    ) -> Result<(), SimulationError> {
        order.validate()?;
        let features = derive_features(order.quantity, snapshot, order.volatility, at)?;
        self.slippage.lock().update_model(
            features.order_size,
            features.depth,
            features.volatility,
            at,
            observed_slippage,
        )?;
        Ok(())
    }

    /// Feed an observed fill outcome back into the classifier
    pub fn record_fill(
        &self,
        order: &OrderParams,
        snapshot: &OrderBookSnapshot,
        is_maker: bool,
        at: DateTime<Utc>,
    ) -> Result<(), SimulationError> {
        order.validate()?;
        let features = derive_features(order.quantity, snapshot, order.volatility, at)?;
        self.maker_taker.lock().update_model(
            features.order_size,
            features.depth,
            features.spread,
            at,
            features.volatility,
            is_maker,
        )?;
        Ok(())
    }

    pub fn metrics(&self) -> AggregatorMetrics {
        AggregatorMetrics {
            slippage: self.slippage.lock().get_model_metrics(),
            maker_taker: self.maker_taker.lock().get_model_metrics(),
        }
    }
}

impl Default for CostAggregator {
    fn default() -> Self {
        Self::new(
            AlmgrenChrissModel::default(),
            OnlineModelConfig::default(),
            FeeSchedule::default(),
            1.0,
        )
    }
}
