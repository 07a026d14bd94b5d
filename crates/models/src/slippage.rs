use chrono::{DateTime, Utc};
use log::{debug, error, warn};

use crate::error::{ModelError, Result};
use crate::features::{SLIPPAGE_FEATURES, slippage_features};
use crate::history::{OnlineModelConfig, TrainingHistory, TrainingSample};
use crate::metrics::ModelMetrics;
use crate::regression::{LinearFit, fit_linear};

/// Online linear regressor for expected slippage.
///
/// Every update past `min_samples` refits on the whole retained window.
/// Until the first fit, estimates use `(size / depth) · volatility`.
#[derive(Debug, Clone)]
pub struct SlippageEstimator {
    history: TrainingHistory<f64>,
    fit: Option<LinearFit>,
    min_samples: usize,
}

impl SlippageEstimator {
    pub fn new(config: OnlineModelConfig) -> Self {
        Self {
            history: TrainingHistory::new(config.retention),
            fit: None,
            min_samples: config.min_samples.max(1),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &SLIPPAGE_FEATURES
    }

    /// Untrained estimate
    pub fn heuristic(order_size: f64, market_depth: f64, volatility: f64) -> f64 {
        (order_size / market_depth) * volatility
    }

    /// Expected slippage as a fraction, never negative.
    ///
    /// Fails only for unusable inputs (for example zero depth).
    pub fn estimate_slippage(
        &self,
        order_size: f64,
        market_depth: f64,
        volatility: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<f64> {
        let features = slippage_features(order_size, market_depth, volatility, timestamp)?;
        let heuristic = Self::heuristic(order_size, market_depth, volatility);

        let Some(fit) = &self.fit else {
            return Ok(heuristic);
        };

        let predicted = fit.predict(&features);
        if predicted.is_finite() {
            Ok(predicted.max(0.0))
        } else {
            error!("Slippage prediction is not finite ({}), using heuristic", predicted);
            Ok(heuristic)
        }
    }

    /// Record an observed slippage and refit once enough samples exist.
    ///
    /// A failed refit is logged and the previous fit is kept.
    pub fn update_model(
        &mut self,
        order_size: f64,
        market_depth: f64,
        volatility: f64,
        timestamp: DateTime<Utc>,
        observed_slippage: f64,
    ) -> Result<()> {
        if !observed_slippage.is_finite() {
            return Err(ModelError::invalid(format!("observed slippage {}", observed_slippage)));
        }
        let features = slippage_features(order_size, market_depth, volatility, timestamp)?;

        self.history.push(TrainingSample {
            features: features.to_vec(),
            label: observed_slippage,
            timestamp,
        });

        if self.history.len() >= self.min_samples {
            self.retrain();
        }
        Ok(())
    }

    fn retrain(&mut self) {
        let rows = self.history.rows();
        let targets = self.history.labels();
        match fit_linear(&rows, &targets) {
            Ok(fit) => {
                debug!(
                    "Slippage model refit on {} samples: coefficients={:?} intercept={}",
                    rows.len(),
                    fit.coefficients,
                    fit.intercept
                );
                self.fit = Some(fit);
            }
            Err(e) => warn!("Slippage refit failed, keeping previous model: {}", e),
        }
    }

    pub fn get_model_metrics(&self) -> ModelMetrics {
        let Some(fit) = &self.fit else {
            return ModelMetrics::untrained(self.history.len());
        };

        let rows = self.history.rows();
        let targets = self.history.labels();
        let mut metrics = ModelMetrics::trained(
            self.history.len(),
            &SLIPPAGE_FEATURES,
            &fit.coefficients,
            fit.intercept,
        );
        metrics.r2_score = Some(fit.r_squared(&rows, &targets));
        metrics
    }
}

impl Default for SlippageEstimator {
    fn default() -> Self {
        Self::new(OnlineModelConfig::default())
    }
}
