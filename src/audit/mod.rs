//! Fairness auditing
//!
//! Two independent observers with bounded FIFO histories:
//! - [`NeutralFeatureAuditor`] watches score spread across neutral signal bands
//! - [`BiasAuditor`] watches overall-score disparity across declared sensitive attributes
//!
//! Neither feeds back into scoring.

pub mod history;
pub mod neutral;
pub mod sensitive;

pub use history::BoundedHistory;
pub use neutral::{NeutralBands, NeutralFairnessReport, NeutralFeatureAuditor};
pub use sensitive::{BiasAuditReport, BiasAuditor};

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Both auditor histories, as saved between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditState {
    pub neutral: NeutralFeatureAuditor,
    pub bias: BiasAuditor,
}

impl AuditState {
    pub fn new(neutral_capacity: usize, sensitive_capacity: usize) -> Self {
        Self {
            neutral: NeutralFeatureAuditor::new(neutral_capacity),
            bias: BiasAuditor::new(sensitive_capacity),
        }
    }

    /// Load saved histories, re-applying the configured capacities
    pub fn from_json(
        json: &str,
        neutral_capacity: usize,
        sensitive_capacity: usize,
    ) -> Result<Self, ComputeError> {
        let mut state: AuditState = serde_json::from_str(json)
            .map_err(|e| ComputeError::HistoryError(format!("Failed to load audit history: {}", e)))?;
        state.neutral.history_mut().set_capacity(neutral_capacity);
        state.bias.history_mut().set_capacity(sensitive_capacity);
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string(self)
            .map_err(|e| ComputeError::HistoryError(format!("Failed to save audit history: {}", e)))
    }

    pub fn clear(&mut self) {
        self.neutral.clear();
        self.bias.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::AdvancedScores;
    use crate::metrics::SessionMetricsAggregator;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_state_round_trip_and_capacity() {
        let mut state = AuditState::new(10, 10);
        let metrics = SessionMetricsAggregator::aggregate(&[], &[]);
        let context: BTreeMap<String, serde_json::Value> =
            BTreeMap::from([("age".to_string(), json!(30))]);
        for i in 0..4 {
            state
                .neutral
                .analyze(&format!("s{}", i), &AdvancedScores::default(), &metrics);
            state.bias.audit(&context, 50.0);
        }

        let json = state.to_json().unwrap();
        let restored = AuditState::from_json(&json, 2, 3).unwrap();
        assert_eq!(restored.neutral.sample_count(), 2);
        assert_eq!(restored.bias.sample_count(), 3);
        assert_eq!(restored.neutral.history().capacity(), 2);
    }

    #[test]
    fn test_invalid_history() {
        assert!(matches!(
            AuditState::from_json("nope", 10, 10),
            Err(ComputeError::HistoryError(_))
        ));
    }
}
