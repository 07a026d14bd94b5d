use chrono::{DateTime, Utc};
use log::{debug, error, warn};

use crate::error::{ModelError, Result};
use crate::features::{MAKER_TAKER_FEATURES, maker_taker_features};
use crate::history::{OnlineModelConfig, TrainingHistory, TrainingSample};
use crate::metrics::ModelMetrics;
use crate::regression::{LogisticFit, fit_logistic};

/// Served before any fit exists
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// Inverse L2 regularization strength for the classifier
const REGULARIZATION_C: f64 = 1.0;

/// Online logistic classifier for the probability of a maker fill.
///
/// Refits on the retained window after every update past `min_samples`,
/// provided both outcomes are present. Predictions never fail: on any error
/// the last successful prediction is served.
#[derive(Debug, Clone)]
pub struct MakerTakerEstimator {
    history: TrainingHistory<bool>,
    fit: Option<LogisticFit>,
    last_prediction: f64,
    min_samples: usize,
}

impl MakerTakerEstimator {
    pub fn new(config: OnlineModelConfig) -> Self {
        Self {
            history: TrainingHistory::new(config.retention),
            fit: None,
            last_prediction: NEUTRAL_PROBABILITY,
            min_samples: config.min_samples.max(1),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    pub fn last_prediction(&self) -> f64 {
        self.last_prediction
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &MAKER_TAKER_FEATURES
    }

    /// Probability in [0, 1] that the order executes as maker
    pub fn predict_maker_probability(
        &mut self,
        order_size: f64,
        market_depth: f64,
        spread: f64,
        timestamp: DateTime<Utc>,
        volatility: f64,
    ) -> f64 {
        let Some(fit) = &self.fit else {
            return self.last_prediction;
        };

        let probability = maker_taker_features(order_size, market_depth, spread, timestamp, volatility)
            .and_then(|features| {
                let p = fit.predict_proba(&features);
                if p.is_finite() {
                    Ok(p)
                } else {
                    Err(ModelError::Computation(format!("probability is not finite: {}", p)))
                }
            });

        match probability {
            Ok(p) => {
                self.last_prediction = p;
                p
            }
            Err(e) => {
                error!("Maker probability prediction failed: {}", e);
                self.last_prediction
            }
        }
    }

    /// Record an observed fill outcome and refit when possible
    pub fn update_model(
        &mut self,
        order_size: f64,
        market_depth: f64,
        spread: f64,
        timestamp: DateTime<Utc>,
        volatility: f64,
        is_maker: bool,
    ) -> Result<()> {
        let features = maker_taker_features(order_size, market_depth, spread, timestamp, volatility)?;

        self.history.push(TrainingSample {
            features: features.to_vec(),
            label: is_maker,
            timestamp,
        });

        if self.history.len() >= self.min_samples {
            self.retrain();
        }
        Ok(())
    }

    fn retrain(&mut self) {
        let rows = self.history.rows();
        let labels = self.history.labels();
        match fit_logistic(&rows, &labels, REGULARIZATION_C) {
            Ok(fit) => {
                debug!(
                    "Maker/taker model refit on {} samples in {} iterations",
                    rows.len(),
                    fit.iterations
                );
                self.fit = Some(fit);
            }
            Err(ModelError::SingleClass) => {
                debug!("Only one outcome observed so far, skipping maker/taker refit");
                if self.fit.is_none() {
                    self.last_prediction = NEUTRAL_PROBABILITY;
                }
            }
            Err(e) => warn!("Maker/taker refit failed, keeping previous model: {}", e),
        }
    }

    pub fn get_model_metrics(&self) -> ModelMetrics {
        let Some(fit) = &self.fit else {
            return ModelMetrics::untrained(self.history.len());
        };

        let rows = self.history.rows();
        let labels = self.history.labels();
        let mut metrics = ModelMetrics::trained(
            self.history.len(),
            &MAKER_TAKER_FEATURES,
            &fit.coefficients,
            fit.intercept,
        );
        metrics.accuracy = Some(fit.accuracy(&rows, &labels));
        metrics
    }
}

impl Default for MakerTakerEstimator {
    fn default() -> Self {
        Self::new(OnlineModelConfig::default())
    }
}
