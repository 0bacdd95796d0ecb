//! Fixed-weight linear regression heads
//!
//! Each head maps a feature vector to a 0-100 score through a logistic squash.
//! The readiness model pools the per-window fused vectors and runs three heads
//! over the result.

use crate::stats::{round_to, sigmoid_to_100};
use crate::types::{FusedWindow, FUSED_VECTOR_LEN};
use serde::{Deserialize, Serialize};

/// Linear head with a logistic output on the 0-100 scale
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionHead {
    weights: Vec<f64>,
    bias: f64,
}

impl RegressionHead {
    pub fn new(weights: &[f64], bias: f64) -> Self {
        Self {
            weights: weights.to_vec(),
            bias,
        }
    }

    /// `sigmoid(bias + Σ wᵢxᵢ)·100` over the shorter of the two lengths.
    /// An empty feature vector scores 50.
    pub fn predict(&self, features: &[f64]) -> f64 {
        if features.is_empty() {
            return 50.0;
        }
        let raw = self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid_to_100(raw)
    }
}

/// Readiness ensemble predictions (0-100, 2 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessPrediction {
    pub confidence: f64,
    pub communication_effectiveness: f64,
    pub interview_readiness: f64,
}

/// Three heads over the mean-pooled fused vector
#[derive(Debug, Clone)]
pub struct InterviewReadinessModel {
    confidence: RegressionHead,
    communication: RegressionHead,
    readiness: RegressionHead,
}

impl Default for InterviewReadinessModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewReadinessModel {
    pub fn new() -> Self {
        // [happy, neutral, sad, rate, pitch, pause, relevance, sentiment, coherence, center]
        Self {
            confidence: RegressionHead::new(
                &[0.45, 0.32, -0.3, 0.004, 0.001, -0.25, 0.28, 0.35, 0.24, 0.42],
                -0.15,
            ),
            communication: RegressionHead::new(
                &[0.28, 0.22, -0.18, 0.005, 0.0006, -0.2, 0.55, 0.26, 0.5, 0.25],
                -0.12,
            ),
            readiness: RegressionHead::new(
                &[0.3, 0.25, -0.22, 0.004, 0.0008, -0.18, 0.4, 0.22, 0.4, 0.35],
                -0.1,
            ),
        }
    }

    pub fn predict(&self, windows: &[FusedWindow]) -> ReadinessPrediction {
        let pooled = pool_fused_vectors(windows);
        ReadinessPrediction {
            confidence: round_to(self.confidence.predict(&pooled), 2),
            communication_effectiveness: round_to(self.communication.predict(&pooled), 2),
            interview_readiness: round_to(self.readiness.predict(&pooled), 2),
        }
    }
}

/// Column-wise mean of the fused vectors; zeros when there are no windows
pub fn pool_fused_vectors(windows: &[FusedWindow]) -> [f64; FUSED_VECTOR_LEN] {
    let mut pooled = [0.0; FUSED_VECTOR_LEN];
    if windows.is_empty() {
        return pooled;
    }
    for window in windows {
        for (slot, value) in pooled.iter_mut().zip(window.fused_vector) {
            *slot += value;
        }
    }
    let count = windows.len() as f64;
    pooled.iter_mut().for_each(|v| *v /= count);
    pooled
}
