//! Neutral-feature fairness auditor
//!
//! Buckets every session by non-demographic signal bands and watches whether
//! the advanced scores drift apart between buckets over the retained history.

use super::history::BoundedHistory;
use crate::config::DEFAULT_NEUTRAL_HISTORY_CAPACITY;
use crate::encoder::{AdvancedScores, SCORE_KEYS};
use crate::stats::{clamp, mean, normalize_percent, round_to};
use crate::types::SessionMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Bucket-mean spread above which a score is flagged
pub const SPREAD_THRESHOLD: f64 = 18.0;

/// History size required before any warning is raised
pub const MIN_SAMPLES_FOR_WARNING: usize = 15;

/// Band assignment of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralBands {
    pub eye_contact_band: String,
    pub speaking_rate_band: String,
    pub pause_band: String,
    pub content_relevance_band: String,
}

impl NeutralBands {
    pub fn from_metrics(metrics: &SessionMetrics) -> Self {
        let relevance = mean(metrics.segment_labels.iter().map(|l| l.text_relevance_score));
        Self {
            eye_contact_band: eye_contact_band(metrics.engagement_metrics.eye_contact_ratio)
                .to_string(),
            speaking_rate_band: speaking_rate_band(metrics.speech_quality_metrics.speaking_rate_wpm)
                .to_string(),
            pause_band: pause_band(metrics.speech_quality_metrics.average_pause_duration)
                .to_string(),
            content_relevance_band: relevance_band(relevance).to_string(),
        }
    }

    /// `(band name, bucket)` pairs
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("eyeContactBand", self.eye_contact_band.as_str()),
            ("speakingRateBand", self.speaking_rate_band.as_str()),
            ("pauseBand", self.pause_band.as_str()),
            ("contentRelevanceBand", self.content_relevance_band.as_str()),
        ]
    }

    fn bucket(&self, band: &str) -> &str {
        match band {
            "eyeContactBand" => self.eye_contact_band.as_str(),
            "speakingRateBand" => self.speaking_rate_band.as_str(),
            "pauseBand" => self.pause_band.as_str(),
            "contentRelevanceBand" => self.content_relevance_band.as_str(),
            _ => "unknown",
        }
    }
}

pub fn eye_contact_band(ratio: f64) -> &'static str {
    let percent = normalize_percent(ratio);
    if percent >= 75.0 {
        "high_eye_contact"
    } else if percent >= 45.0 {
        "medium_eye_contact"
    } else {
        "low_eye_contact"
    }
}

pub fn speaking_rate_band(rate: f64) -> &'static str {
    if rate <= 0.0 {
        "unknown_rate"
    } else if rate < 110.0 {
        "slow_rate"
    } else if rate <= 160.0 {
        "optimal_rate"
    } else {
        "fast_rate"
    }
}

pub fn pause_band(pause: f64) -> &'static str {
    if pause <= 0.0 {
        "minimal_pause"
    } else if pause < 0.5 {
        "short_pause"
    } else if pause < 1.0 {
        "moderate_pause"
    } else {
        "long_pause"
    }
}

pub fn relevance_band(relevance: f64) -> &'static str {
    if relevance >= 80.0 {
        "high_relevance"
    } else if relevance >= 60.0 {
        "medium_relevance"
    } else {
        "low_relevance"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralSample {
    pub session_id: String,
    pub bands: NeutralBands,
    pub scores: AdvancedScores,
}

/// Per-bucket means of one score within one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpread {
    pub bucket_means: BTreeMap<String, f64>,
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralFairnessReport {
    pub sample_count: usize,
    pub neutral_metrics_used: Vec<String>,
    /// band → score key → spread
    pub group_variance: BTreeMap<String, BTreeMap<String, BucketSpread>>,
    pub warnings: Vec<String>,
}

/// Observer over neutral feature bands; never alters scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralFeatureAuditor {
    history: BoundedHistory<NeutralSample>,
}

impl Default for NeutralFeatureAuditor {
    fn default() -> Self {
        Self::new(DEFAULT_NEUTRAL_HISTORY_CAPACITY)
    }
}

impl NeutralFeatureAuditor {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: BoundedHistory::new(capacity),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &BoundedHistory<NeutralSample> {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut BoundedHistory<NeutralSample> {
        &mut self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Record the session and report per-band spreads over the whole history
    pub fn analyze(
        &mut self,
        session_id: &str,
        scores: &AdvancedScores,
        metrics: &SessionMetrics,
    ) -> NeutralFairnessReport {
        let bands = NeutralBands::from_metrics(metrics);
        let band_names: Vec<&'static str> = bands.entries().iter().map(|(name, _)| *name).collect();

        self.history.push(NeutralSample {
            session_id: session_id.to_string(),
            bands,
            scores: scores.map(|v| clamp(v, 0.0, 100.0)),
        });
        let sample_count = self.history.len();

        let mut group_variance = BTreeMap::new();
        let mut warnings = Vec::new();

        for band in &band_names {
            // bucket → per-key score series
            let mut grouped: BTreeMap<&str, [Vec<f64>; 4]> = BTreeMap::new();
            for sample in self.history.iter() {
                let series = grouped.entry(sample.bands.bucket(band)).or_default();
                for (slot, value) in series.iter_mut().zip(sample.scores.to_array()) {
                    slot.push(value);
                }
            }

            let mut band_report = BTreeMap::new();
            for (key_idx, key) in SCORE_KEYS.iter().enumerate() {
                let means: BTreeMap<String, f64> = grouped
                    .iter()
                    .filter(|(_, series)| !series[key_idx].is_empty())
                    .map(|(bucket, series)| {
                        (bucket.to_string(), mean(series[key_idx].iter().copied()))
                    })
                    .collect();
                let spread = value_range(means.values().copied());

                if means.len() >= 2
                    && spread > SPREAD_THRESHOLD
                    && sample_count >= MIN_SAMPLES_FOR_WARNING
                {
                    warnings.push(format!(
                        "Score spread for {} across {} is {:.2}; investigate calibration.",
                        key, band, spread
                    ));
                }

                band_report.insert(
                    key.to_string(),
                    BucketSpread {
                        bucket_means: means.into_iter().map(|(k, v)| (k, round_to(v, 2))).collect(),
                        spread: round_to(spread, 2),
                    },
                );
            }
            group_variance.insert(band.to_string(), band_report);
        }

        if !warnings.is_empty() {
            warn!(session_id, ?warnings, "neutral fairness warnings");
        }

        let mut neutral_metrics_used: Vec<String> =
            band_names.iter().map(|name| name.to_string()).collect();
        neutral_metrics_used.sort();

        NeutralFairnessReport {
            sample_count,
            neutral_metrics_used,
            group_variance,
            warnings,
        }
    }
}

/// max − min, 0 when empty
fn value_range(values: impl Iterator<Item = f64>) -> f64 {
    let mut range: Option<(f64, f64)> = None;
    for value in values {
        range = Some(match range {
            Some((low, high)) => (low.min(value), high.max(value)),
            None => (value, value),
        });
    }
    range.map(|(low, high)| high - low).unwrap_or(0.0)
}
