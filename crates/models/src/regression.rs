//! Batch fitting routines used by the online estimators
//!
//! - [`fit_linear`]: ordinary least squares with intercept, solved by SVD on
//!   centered data (minimum-norm when columns are collinear or constant)
//! - [`fit_logistic`]: L2-regularized logistic regression, Newton iterations
//!   with backtracking; the intercept is not penalized

use nalgebra::{DMatrix, DVector};

use crate::error::{ModelError, Result};

const MAX_NEWTON_ITERATIONS: usize = 100;
const NEWTON_TOLERANCE: f64 = 1e-8;
const INTERCEPT_RIDGE: f64 = 1e-10;

/// Fitted linear model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept + dot(&self.coefficients, x)
    }

    /// Coefficient of determination on the given data.
    ///
    /// A constant target scores 1.0 if reproduced exactly, otherwise 0.0.
    pub fn r_squared(&self, rows: &[&[f64]], targets: &[f64]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let mean = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (row, y) in rows.iter().zip(targets) {
            ss_res += (y - self.predict(row)).powi(2);
            ss_tot += (y - mean).powi(2);
        }

        if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res <= f64::EPSILON {
            1.0
        } else {
            0.0
        }
    }
}

/// Least-squares fit of `targets ≈ intercept + rows · β`
pub fn fit_linear(rows: &[&[f64]], targets: &[f64]) -> Result<LinearFit> {
    let width = check_design(rows, targets.len())?;
    if targets.iter().any(|y| !y.is_finite()) {
        return Err(ModelError::invalid("non-finite target"));
    }

    let n = rows.len();
    let means = column_means(rows, width);
    let y_mean = targets.iter().sum::<f64>() / n as f64;

    let x = DMatrix::from_fn(n, width, |i, j| rows[i][j] - means[j]);
    let y = DVector::from_fn(n, |i, _| targets[i] - y_mean);

    let svd = x.svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = (max_sv * n.max(width) as f64 * f64::EPSILON).max(f64::MIN_POSITIVE);
    let beta = svd
        .solve(&y, eps)
        .map_err(|e| ModelError::Computation(e.to_string()))?;

    let coefficients: Vec<f64> = beta.iter().copied().collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::Computation("least squares diverged".into()));
    }
    let intercept = y_mean - dot(&coefficients, &means);

    Ok(LinearFit {
        coefficients,
        intercept,
    })
}

/// Fitted logistic model
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub iterations: usize,
}

impl LogisticFit {
    /// Probability of the positive class
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        sigmoid(self.intercept + dot(&self.coefficients, x))
    }

    /// Share of rows classified correctly at the 0.5 threshold
    pub fn accuracy(&self, rows: &[&[f64]], labels: &[bool]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let correct = rows
            .iter()
            .zip(labels)
            .filter(|(row, label)| (self.predict_proba(row) >= 0.5) == **label)
            .count();
        correct as f64 / labels.len() as f64
    }
}

/// Fit `P(label) = σ(intercept + rows · β)` minimizing
/// `½‖β‖² + c · Σ logloss`.
///
/// Fails with [`ModelError::SingleClass`] unless both labels are present.
pub fn fit_logistic(rows: &[&[f64]], labels: &[bool], c: f64) -> Result<LogisticFit> {
    let width = check_design(rows, labels.len())?;
    if !(c.is_finite() && c > 0.0) {
        return Err(ModelError::invalid(format!("regularization C must be positive, got {}", c)));
    }
    let positives = labels.iter().filter(|l| **l).count();
    if positives == 0 || positives == labels.len() {
        return Err(ModelError::SingleClass);
    }

    let n = rows.len();
    let dim = width + 1;
    // Design matrix with a trailing intercept column
    let x = DMatrix::from_fn(n, dim, |i, j| if j < width { rows[i][j] } else { 1.0 });
    let y = DVector::from_fn(n, |i, _| if labels[i] { 1.0 } else { 0.0 });

    let mut w = DVector::zeros(dim);
    let mut loss = objective(&x, &y, &w, c, width);
    let mut iterations = 0;

    while iterations < MAX_NEWTON_ITERATIONS {
        iterations += 1;

        let z = &x * &w;
        let p = z.map(sigmoid);
        let s = p.map(|pi| pi * (1.0 - pi));

        let mut gradient = x.transpose() * (&p - &y) * c;
        let mut weighted = x.clone();
        for (i, mut row) in weighted.row_iter_mut().enumerate() {
            row *= s[i];
        }
        let mut hessian = x.transpose() * weighted * c;
        for j in 0..dim {
            if j < width {
                gradient[j] += w[j];
                hessian[(j, j)] += 1.0;
            } else {
                hessian[(j, j)] += INTERCEPT_RIDGE;
            }
        }

        let step = hessian
            .cholesky()
            .ok_or_else(|| ModelError::Computation("Hessian is not positive definite".into()))?
            .solve(&gradient);

        // Backtracking keeps each step a descent step
        let mut scale = 1.0;
        let mut candidate = &w - &step;
        let mut candidate_loss = objective(&x, &y, &candidate, c, width);
        while candidate_loss > loss && scale > 1e-6 {
            scale *= 0.5;
            candidate = &w - &step * scale;
            candidate_loss = objective(&x, &y, &candidate, c, width);
        }

        let moved = (&candidate - &w).amax();
        w = candidate;
        loss = candidate_loss;
        if moved < NEWTON_TOLERANCE {
            break;
        }
    }

    if w.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Computation("logistic fit diverged".into()));
    }

    Ok(LogisticFit {
        coefficients: w.rows(0, width).iter().copied().collect(),
        intercept: w[width],
        iterations,
    })
}

fn objective(x: &DMatrix<f64>, y: &DVector<f64>, w: &DVector<f64>, c: f64, width: usize) -> f64 {
    let z = x * w;
    let log_loss: f64 = z
        .iter()
        .zip(y.iter())
        .map(|(zi, yi)| softplus(*zi) - yi * zi)
        .sum();
    let penalty: f64 = w.rows(0, width).norm_squared() * 0.5;
    penalty + c * log_loss
}

fn check_design(rows: &[&[f64]], targets: usize) -> Result<usize> {
    if rows.is_empty() {
        return Err(ModelError::invalid("no training rows"));
    }
    if rows.len() != targets {
        return Err(ModelError::invalid(format!(
            "{} rows but {} labels",
            rows.len(),
            targets
        )));
    }
    let width = rows[0].len();
    if width == 0 {
        return Err(ModelError::invalid("rows have no features"));
    }
    if rows.iter().any(|r| r.len() != width) {
        return Err(ModelError::invalid("rows differ in width"));
    }
    if rows.iter().flat_map(|r| r.iter()).any(|v| !v.is_finite()) {
        return Err(ModelError::invalid("non-finite feature"));
    }
    Ok(width)
}

fn column_means(rows: &[&[f64]], width: usize) -> Vec<f64> {
    let mut means = vec![0.0; width];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row.iter()) {
            *m += v;
        }
    }
    let n = rows.len() as f64;
    means.iter_mut().for_each(|m| *m /= n);
    means
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_exact_fit() {
        // y = 1 + 2a - 3b
        let data = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [2.0, 1.0], [3.0, 2.0]];
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let targets: Vec<f64> = data.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let fit = fit_linear(&rows, &targets).unwrap();
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], -3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared(&rows, &targets), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_constant_column_gets_zero_weight() {
        let data = [[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let targets = [2.0, 4.0, 6.0, 8.0];

        let fit = fit_linear(&rows, &targets).unwrap();
        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.predict(&[5.0, 5.0]), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_rejects_bad_input() {
        assert!(fit_linear(&[], &[]).is_err());
        let row = [1.0, f64::NAN];
        assert!(fit_linear(&[row.as_slice()], &[1.0]).is_err());
        assert!(fit_linear(&[[1.0].as_slice()], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_r_squared_constant_target() {
        let fit = LinearFit {
            coefficients: vec![0.0],
            intercept: 1.0,
        };
        let rows: [&[f64]; 2] = [&[1.0], &[2.0]];
        assert_eq!(fit.r_squared(&rows, &[1.0, 1.0]), 1.0);
        assert_eq!(fit.r_squared(&rows, &[3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_logistic_separates_classes() {
        let data: Vec<[f64; 1]> = (0..20).map(|i| [i as f64 / 2.0]).collect();
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let labels: Vec<bool> = data.iter().map(|r| r[0] < 5.0).collect();

        let fit = fit_logistic(&rows, &labels, 1.0).unwrap();
        assert!(fit.coefficients[0] < 0.0);
        assert!(fit.predict_proba(&[0.0]) > 0.5);
        assert!(fit.predict_proba(&[9.5]) < 0.5);
        assert!(fit.accuracy(&rows, &labels) >= 0.9);
        assert!(fit.iterations <= MAX_NEWTON_ITERATIONS);
    }

    #[test]
    fn test_logistic_balanced_noise_is_neutral() {
        let data = [[1.0], [1.0], [2.0], [2.0]];
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let labels = [true, false, true, false];

        let fit = fit_logistic(&rows, &labels, 1.0).unwrap();
        assert_relative_eq!(fit.predict_proba(&[1.5]), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_logistic_single_class() {
        let rows: [&[f64]; 2] = [&[1.0], &[2.0]];
        assert_eq!(
            fit_logistic(&rows, &[true, true], 1.0),
            Err(ModelError::SingleClass)
        );
    }

    #[test]
    fn test_sigmoid_and_softplus_are_stable() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert_relative_eq!(softplus(0.0), 2.0_f64.ln());
        assert_eq!(softplus(1000.0), 1000.0);
    }
}
