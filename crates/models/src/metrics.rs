use serde::Serialize;
use std::collections::BTreeMap;

/// Introspection snapshot of an online estimator.
///
/// Statistical fields are omitted until the model has been fitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub is_trained: bool,
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercept: Option<f64>,
}

impl ModelMetrics {
    pub fn untrained(data_points: usize) -> Self {
        Self {
            is_trained: false,
            data_points,
            r2_score: None,
            accuracy: None,
            coefficients: None,
            intercept: None,
        }
    }

    pub(crate) fn trained(data_points: usize, names: &[&str], coefficients: &[f64], intercept: f64) -> Self {
        Self {
            is_trained: true,
            data_points,
            r2_score: None,
            accuracy: None,
            coefficients: Some(
                names
                    .iter()
                    .zip(coefficients)
                    .map(|(name, c)| (name.to_string(), *c))
                    .collect(),
            ),
            intercept: Some(intercept),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untrained_shape() {
        let json = serde_json::to_value(ModelMetrics::untrained(3)).unwrap();
        assert_eq!(json, json!({"isTrained": false, "dataPoints": 3}));
    }

    #[test]
    fn test_trained_shape() {
        let mut metrics = ModelMetrics::trained(12, &["a", "b"], &[1.5, -2.0], 0.25);
        metrics.r2_score = Some(0.9);
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(
            json,
            json!({
                "isTrained": true,
                "dataPoints": 12,
                "r2Score": 0.9,
                "coefficients": {"a": 1.5, "b": -2.0},
                "intercept": 0.25
            })
        );
    }
}
