//! Behavioral tests for the online estimators and the impact model
//! across parameter ranges.

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use tcsim_models::{
    AlmgrenChrissModel, AlmgrenChrissParams, MakerTakerEstimator, NEUTRAL_PROBABILITY,
    OnlineModelConfig, SlippageEstimator,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, hour, minute, 0).unwrap()
}

#[test]
fn test_untrained_slippage_is_heuristic() {
    let estimator = SlippageEstimator::default();
    for (size, depth, vol) in [(10.0, 10.0, 0.02), (1.0, 250.0, 0.5), (7.5, 3.0, 0.0)] {
        let estimate = estimator.estimate_slippage(size, depth, vol, at(9, 30)).unwrap();
        assert_eq!(estimate, (size / depth) * vol);
    }
    assert!(!estimator.get_model_metrics().is_trained);
}

#[test]
fn test_slippage_learns_linear_relationship() {
    let _ = env_logger::try_init();
    let mut estimator = SlippageEstimator::default();
    let depth = 100.0;

    for i in 0..10 {
        let size = 5.0 + 10.0 * i as f64;
        let observed = 0.002 * (size / depth) + 0.0001;
        estimator
            .update_model(size, depth, 0.02, at(10, 0), observed)
            .unwrap();
        assert_eq!(estimator.is_trained(), i == 9);
    }

    let metrics = estimator.get_model_metrics();
    assert!(metrics.is_trained);
    assert_eq!(metrics.data_points, 10);
    assert!(metrics.r2_score.unwrap() > 0.0);
    assert_eq!(metrics.coefficients.as_ref().unwrap().len(), 4);

    for size in [0.0, 1.0, 50.0, 500.0, 5000.0] {
        for depth in [1.0, 100.0, 1e6] {
            let estimate = estimator.estimate_slippage(size, depth, 0.9, at(23, 59)).unwrap();
            assert!(estimate >= 0.0 && estimate.is_finite());
        }
    }

    let small = estimator.estimate_slippage(10.0, depth, 0.02, at(10, 5)).unwrap();
    let large = estimator.estimate_slippage(90.0, depth, 0.02, at(10, 5)).unwrap();
    assert!(large > small);
}

#[test]
fn test_slippage_rejects_unusable_inputs() {
    let mut estimator = SlippageEstimator::default();
    assert!(estimator.estimate_slippage(1.0, 0.0, 0.02, at(1, 0)).is_err());
    assert!(estimator.update_model(1.0, 0.0, 0.02, at(1, 0), 0.1).is_err());
    assert!(estimator.update_model(1.0, 1.0, 0.02, at(1, 0), f64::NAN).is_err());
    assert_eq!(estimator.get_model_metrics().data_points, 0);
}

#[test]
fn test_history_is_capped() {
    let config = OnlineModelConfig {
        min_samples: 10,
        retention: 50,
    };
    let mut estimator = SlippageEstimator::new(config);
    for i in 0..75 {
        estimator
            .update_model(1.0 + i as f64, 100.0, 0.02, at(12, 0), 0.001 * i as f64)
            .unwrap();
    }
    assert_eq!(estimator.get_model_metrics().data_points, 50);
}

#[test]
fn test_single_class_never_fits() {
    let mut estimator = MakerTakerEstimator::default();
    for i in 0..40 {
        estimator
            .update_model(1.0 + i as f64, 100.0, 0.5, at(8, 0), 0.02, true)
            .unwrap();
        let p = estimator.predict_maker_probability(5.0, 100.0, 0.5, at(8, 0), 0.02);
        assert_eq!(p, NEUTRAL_PROBABILITY);
    }
    assert!(!estimator.is_trained());
    let metrics = estimator.get_model_metrics();
    assert!(!metrics.is_trained);
    assert_eq!(metrics.data_points, 40);
    assert!(metrics.accuracy.is_none());
}

#[test]
fn test_maker_taker_learns_size_effect() {
    let mut estimator = MakerTakerEstimator::default();
    // Small orders rest on the book, large ones cross it
    for i in 0..30 {
        let size = 1.0 + i as f64;
        estimator
            .update_model(size, 40.0, 0.5, at(14, 0), 0.02, size < 15.0)
            .unwrap();
    }
    assert!(estimator.is_trained());

    let small = estimator.predict_maker_probability(2.0, 40.0, 0.5, at(14, 0), 0.02);
    let large = estimator.predict_maker_probability(30.0, 40.0, 0.5, at(14, 0), 0.02);
    assert!((0.0..=1.0).contains(&small));
    assert!((0.0..=1.0).contains(&large));
    assert!(small > large);

    let metrics = estimator.get_model_metrics();
    assert!(metrics.accuracy.unwrap() > 0.5);
    assert!(metrics.r2_score.is_none());
    assert_eq!(metrics.coefficients.unwrap().len(), 5);
}

#[test]
fn test_maker_prediction_failure_serves_last_value() {
    let mut estimator = MakerTakerEstimator::default();
    for i in 0..12 {
        estimator
            .update_model(1.0 + i as f64, 20.0, 0.5, at(3, 0), 0.02, i % 3 == 0)
            .unwrap();
    }
    let good = estimator.predict_maker_probability(4.0, 20.0, 0.5, at(3, 0), 0.02);
    let failed = estimator.predict_maker_probability(4.0, 0.0, 0.5, at(3, 0), 0.02);
    assert_eq!(failed, good);
    assert_eq!(estimator.last_prediction(), good);
}

#[test]
fn test_trajectory_properties_across_parameters() {
    for risk_aversion in [0.01, 0.1, 1.0, 10.0] {
        for volatility in [0.001, 0.02, 0.5] {
            for temporary_impact in [0.01, 0.1, 2.0] {
                let model = AlmgrenChrissModel::new(AlmgrenChrissParams {
                    risk_aversion,
                    volatility,
                    temporary_impact,
                    permanent_impact: 0.05,
                })
                .unwrap();
                assert!(model.kappa().unwrap().is_finite());

                for horizon in [0.5, 1.0, 30.0] {
                    let trajectory = model
                        .calculate_optimal_execution(250.0, horizon, 100.0, 20)
                        .unwrap();
                    let remaining = &trajectory.remaining;
                    assert_relative_eq!(remaining[0], 250.0, epsilon = 1e-9);
                    assert_relative_eq!(remaining[19], 0.0, epsilon = 1e-9);
                    assert!(remaining.windows(2).all(|w| w[1] <= w[0]));

                    let impact = model.estimate_market_impact(25.0, 40.0, horizon).unwrap();
                    assert!(impact > 0.0 && impact.is_finite());
                }
            }
        }
    }
}
