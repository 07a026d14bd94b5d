//! Almgren-Chriss market impact
//!
//! Closed form, no fitting. With risk aversion η, volatility σ, temporary
//! impact γ and permanent impact λ:
//!
//! ```text
//! impact(q, D, T) = γ·q/D + λ·q/D + η·σ·√T
//! κ               = √(η·σ² / γ)
//! x(t)            = X · sinh(κ(T−t)) / sinh(κT)
//! price(t)        = p₀ + λ·(X − x(t))
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Below this κT the trajectory is treated as linear
const LINEAR_LIMIT: f64 = 1e-12;

/// Default number of grid points for the execution trajectory
pub const DEFAULT_EXECUTION_STEPS: usize = 100;

/// Parameters for the Almgren-Chriss model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlmgrenChrissParams {
    /// Risk aversion η
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,
    /// Volatility σ
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Temporary impact γ
    #[serde(default = "default_temporary_impact")]
    pub temporary_impact: f64,
    /// Permanent impact λ
    #[serde(default = "default_permanent_impact")]
    pub permanent_impact: f64,
}

impl Default for AlmgrenChrissParams {
    fn default() -> Self {
        Self {
            risk_aversion: default_risk_aversion(),
            volatility: default_volatility(),
            temporary_impact: default_temporary_impact(),
            permanent_impact: default_permanent_impact(),
        }
    }
}

impl AlmgrenChrissParams {
    /// All parameters finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("risk_aversion", self.risk_aversion),
            ("volatility", self.volatility),
            ("temporary_impact", self.temporary_impact),
            ("permanent_impact", self.permanent_impact),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn default_risk_aversion() -> f64 {
    0.1
}

fn default_volatility() -> f64 {
    0.02
}

fn default_temporary_impact() -> f64 {
    0.1
}

fn default_permanent_impact() -> f64 {
    0.05
}

/// Partial parameter update; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParamsUpdate {
    pub risk_aversion: Option<f64>,
    pub volatility: Option<f64>,
    pub temporary_impact: Option<f64>,
    pub permanent_impact: Option<f64>,
}

/// Optimal liquidation schedule over a uniform time grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionTrajectory {
    pub times: Vec<f64>,
    /// Quantity still to execute at each time
    pub remaining: Vec<f64>,
    pub expected_prices: Vec<f64>,
}

impl ExecutionTrajectory {
    /// Quantity executed between consecutive grid points
    pub fn trade_sizes(&self) -> Vec<f64> {
        self.remaining.windows(2).map(|w| w[0] - w[1]).collect()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Almgren-Chriss (2000) impact model
#[derive(Debug, Clone, Default)]
pub struct AlmgrenChrissModel {
    params: AlmgrenChrissParams,
}

impl AlmgrenChrissModel {
    pub fn new(params: AlmgrenChrissParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AlmgrenChrissParams {
        &self.params
    }

    /// Apply a partial update. Nothing changes if the result is invalid.
    pub fn update_parameters(&mut self, update: ImpactParamsUpdate) -> Result<()> {
        let mut next = self.params;
        if let Some(v) = update.risk_aversion {
            next.risk_aversion = v;
        }
        if let Some(v) = update.volatility {
            next.volatility = v;
        }
        if let Some(v) = update.temporary_impact {
            next.temporary_impact = v;
        }
        if let Some(v) = update.permanent_impact {
            next.permanent_impact = v;
        }
        next.validate()?;
        self.params = next;
        Ok(())
    }

    /// Trade-off rate κ = √(η·σ²/γ)
    pub fn kappa(&self) -> Result<f64> {
        let p = &self.params;
        if p.temporary_impact <= 0.0 {
            return Err(ModelError::invalid("temporary impact must be positive"));
        }
        let kappa = (p.risk_aversion * p.volatility.powi(2) / p.temporary_impact).sqrt();
        if kappa.is_finite() {
            Ok(kappa)
        } else {
            Err(ModelError::Computation(format!("kappa is not finite: {}", kappa)))
        }
    }

    /// Timing-risk component `η·σ·√T`, which is also the impact of a
    /// vanishing order
    pub fn risk_term(&self, time_horizon: f64) -> f64 {
        self.params.risk_aversion * self.params.volatility * time_horizon.max(0.0).sqrt()
    }

    /// Expected impact of trading `order_quantity` against `market_depth`
    /// over `time_horizon`, as a fraction of notional
    pub fn estimate_market_impact(
        &self,
        order_quantity: f64,
        market_depth: f64,
        time_horizon: f64,
    ) -> Result<f64> {
        if !market_depth.is_finite() || market_depth <= 0.0 {
            return Err(ModelError::ZeroDepth(market_depth));
        }
        if !order_quantity.is_finite() || order_quantity < 0.0 {
            return Err(ModelError::invalid(format!("order quantity {}", order_quantity)));
        }
        if !time_horizon.is_finite() || time_horizon < 0.0 {
            return Err(ModelError::invalid(format!("time horizon {}", time_horizon)));
        }

        let participation = order_quantity / market_depth;
        let temporary = self.params.temporary_impact * participation;
        let permanent = self.params.permanent_impact * participation;
        Ok(temporary + permanent + self.risk_term(time_horizon))
    }

    /// Optimal liquidation of `total_quantity` over `time_horizon`, sampled
    /// at `steps` evenly spaced points including both ends
    pub fn calculate_optimal_execution(
        &self,
        total_quantity: f64,
        time_horizon: f64,
        initial_price: f64,
        steps: usize,
    ) -> Result<ExecutionTrajectory> {
        if steps < 2 {
            return Err(ModelError::invalid(format!("need at least 2 steps, got {}", steps)));
        }
        if !time_horizon.is_finite() || time_horizon <= 0.0 {
            return Err(ModelError::invalid(format!("time horizon {}", time_horizon)));
        }
        if !total_quantity.is_finite() || !initial_price.is_finite() {
            return Err(ModelError::invalid("quantity and price must be finite"));
        }

        let kappa = self.kappa()?;
        let kt = kappa * time_horizon;
        let last = (steps - 1) as f64;

        let times: Vec<f64> = (0..steps)
            .map(|i| if i + 1 == steps { time_horizon } else { time_horizon * i as f64 / last })
            .collect();

        let mut remaining = Vec::with_capacity(steps);
        let mut previous = total_quantity.abs();
        for &t in &times {
            let fraction = if kt < LINEAR_LIMIT {
                (time_horizon - t) / time_horizon
            } else {
                sinh_ratio(kappa, t, time_horizon)
            };
            // Keep the schedule monotone under rounding
            let x = (total_quantity.abs() * fraction).min(previous);
            previous = x;
            remaining.push(x.copysign(total_quantity));
        }

        let lambda = self.params.permanent_impact;
        let expected_prices = remaining
            .iter()
            .map(|x| initial_price + lambda * (total_quantity - x))
            .collect();

        Ok(ExecutionTrajectory {
            times,
            remaining,
            expected_prices,
        })
    }
}

/// `sinh(κ(T−t)) / sinh(κT)` without overflow for large κT
fn sinh_ratio(kappa: f64, t: f64, horizon: f64) -> f64 {
    let numerator = -(-2.0 * kappa * (horizon - t)).exp_m1();
    let denominator = -(-2.0 * kappa * horizon).exp_m1();
    (-kappa * t).exp() * numerator / denominator
}
