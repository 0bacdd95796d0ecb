//! Sensitive-attribute bias auditor
//!
//! Sensitive and irrelevant context fields are never scoring inputs. This
//! auditor only reports their presence and tracks whether the overall score
//! separates by a declared sensitive attribute.

use super::history::BoundedHistory;
use crate::config::DEFAULT_SENSITIVE_HISTORY_CAPACITY;
use crate::stats::mean;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const SENSITIVE_KEYS: [&str; 8] = [
    "gender",
    "race",
    "ethnicity",
    "age",
    "accent",
    "nationality",
    "religion",
    "disability",
];

pub const IRRELEVANT_KEYS: [&str; 4] = [
    "camera_brand",
    "device_model",
    "network_quality",
    "lighting_condition",
];

/// Group-mean spread above which a disparity is flagged
pub const DISPARITY_THRESHOLD: f64 = 15.0;

/// History size required before a disparity warning is raised
pub const MIN_SAMPLES_FOR_DISPARITY: usize = 20;

pub const IRRELEVANT_FIELDS_WARNING: &str =
    "Irrelevant context fields detected; they are excluded from scoring inputs.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveSample {
    pub overall: f64,
    /// attribute → group label
    pub sensitive: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasAuditReport {
    pub checked_sensitive_attributes: Vec<String>,
    pub checked_irrelevant_attributes: Vec<String>,
    pub warnings: Vec<String>,
    pub history_sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAuditor {
    history: BoundedHistory<SensitiveSample>,
}

impl Default for BiasAuditor {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_HISTORY_CAPACITY)
    }
}

impl BiasAuditor {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: BoundedHistory::new(capacity),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &BoundedHistory<SensitiveSample> {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut BoundedHistory<SensitiveSample> {
        &mut self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Inspect the session context; `overall_performance` is the rule-based overall score
    pub fn audit(
        &mut self,
        context: &BTreeMap<String, Value>,
        overall_performance: f64,
    ) -> BiasAuditReport {
        let sensitive = present_fields(context, &SENSITIVE_KEYS);
        let irrelevant = present_fields(context, &IRRELEVANT_KEYS);

        let mut warnings = Vec::new();
        if !irrelevant.is_empty() {
            warnings.push(IRRELEVANT_FIELDS_WARNING.to_string());
        }

        if !sensitive.is_empty() {
            self.history.push(SensitiveSample {
                overall: overall_performance,
                sensitive: sensitive.clone(),
            });

            for key in sensitive.keys() {
                let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
                for sample in self.history.iter() {
                    if let Some(group) = sample.sensitive.get(key) {
                        groups.entry(group.as_str()).or_default().push(sample.overall);
                    }
                }
                if groups.len() < 2 {
                    continue;
                }

                let means: Vec<f64> = groups.values().map(|v| mean(v.iter().copied())).collect();
                let high = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let low = means.iter().copied().fold(f64::INFINITY, f64::min);
                let spread = high - low;
                if spread > DISPARITY_THRESHOLD && self.history.len() >= MIN_SAMPLES_FOR_DISPARITY {
                    warnings.push(format!(
                        "Potential score disparity detected across '{}' groups (mean spread {:.2}).",
                        key, spread
                    ));
                }
            }
        }

        if warnings.is_empty() {
            debug!("bias audit passed with no detected disparities");
        } else {
            warn!(?warnings, "bias audit warnings");
        }

        BiasAuditReport {
            checked_sensitive_attributes: sensitive.keys().cloned().collect(),
            checked_irrelevant_attributes: irrelevant.into_keys().collect(),
            warnings,
            history_sample_count: self.history.len(),
        }
    }
}

/// Non-null context fields among `keys`, with values rendered as group labels
fn present_fields(context: &BTreeMap<String, Value>, keys: &[&str]) -> BTreeMap<String, String> {
    context
        .iter()
        .filter(|(key, value)| keys.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), group_label(value)))
        .collect()
}

fn group_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
