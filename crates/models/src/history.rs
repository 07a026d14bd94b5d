use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Settings shared by the online estimators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnlineModelConfig {
    /// Samples required before the first fit
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Samples kept; the oldest is evicted first
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for OnlineModelConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            retention: default_retention(),
        }
    }
}

fn default_min_samples() -> usize {
    10
}

fn default_retention() -> usize {
    1000
}

/// One observation: inputs, label and when it was seen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSample<L> {
    pub features: Vec<f64>,
    pub label: L,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO window of training samples
#[derive(Debug, Clone)]
pub struct TrainingHistory<L> {
    samples: VecDeque<TrainingSample<L>>,
    retention: usize,
}

impl<L> TrainingHistory<L> {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            samples: VecDeque::with_capacity(retention.min(1024)),
            retention,
        }
    }

    /// Append a sample, returning the evicted one if the window was full
    pub fn push(&mut self, sample: TrainingSample<L>) -> Option<TrainingSample<L>> {
        let evicted = if self.samples.len() >= self.retention {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingSample<L>> {
        self.samples.iter()
    }

    /// Feature rows, oldest first
    pub fn rows(&self) -> Vec<&[f64]> {
        self.samples.iter().map(|s| s.features.as_slice()).collect()
    }

    pub fn labels(&self) -> Vec<L>
    where
        L: Copy,
    {
        self.samples.iter().map(|s| s.label).collect()
    }
}
