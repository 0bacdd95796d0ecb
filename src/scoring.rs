//! Rule-based composite scoring
//!
//! Pure function of the aggregated session metrics and the aligned windows.
//! Every component is clamped to 0-100 before it is weighted.

use crate::regression::{InterviewReadinessModel, ReadinessPrediction};
use crate::stats::{clamp, mean, mean_opt, normalize_percent, population_variance, round_to};
use crate::types::{EmotionPoint, FusedWindow, GazeDirection, SessionMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gaze stability used when there are no windows
const DEFAULT_GAZE_STABILITY: f64 = 40.0;

/// Mean head motion (degrees) assumed when there are no windows
const DEFAULT_HEAD_MOTION: f64 = 20.0;

/// Emotional regulation for trajectories too short to have a variance
const DEFAULT_EMOTIONAL_REGULATION: f64 = 50.0;

/// Weights of the four components in the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub engagement: f64,
    pub emotional_regulation: f64,
    pub speech_clarity: f64,
    pub content_relevance: f64,
}

pub const OVERALL_WEIGHTS: ScoreWeights = ScoreWeights {
    engagement: 0.3,
    emotional_regulation: 0.2,
    speech_clarity: 0.25,
    content_relevance: 0.25,
};

/// Headline rule-based scores (0-100, 2 decimals)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBasedSummary {
    pub engagement: f64,
    pub emotional_regulation: f64,
    pub speech_clarity: f64,
    pub content_relevance: f64,
    pub overall_performance: f64,
    pub confidence: f64,
    pub communication_effectiveness: f64,
    pub interview_readiness: f64,
}

/// A component score with the intermediate values that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<C> {
    pub score: f64,
    pub components: C,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementComponents {
    pub eye_contact_score: f64,
    pub gaze_stability_score: f64,
    pub head_motion_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalRegulationComponents {
    pub dominant_emotion_variance: f64,
    pub average_emotion_variance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechClarityComponents {
    pub pause_score: f64,
    pub speaking_rate_score: f64,
    pub pitch_variance_score: f64,
    pub pitch_variance: f64,
}

/// Where the content relevance score was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelevanceSource {
    SegmentLabels,
    FusedFeatureVectors,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRelevanceComponents {
    pub source: RelevanceSource,
    pub segment_count: usize,
    pub avg_segment_relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedScores {
    pub engagement: Scored<EngagementComponents>,
    pub emotional_regulation: Scored<EmotionalRegulationComponents>,
    pub speech_clarity: Scored<SpeechClarityComponents>,
    pub content_relevance: Scored<ContentRelevanceComponents>,
    pub model_predictions: ReadinessPrediction,
    pub weights: ScoreWeights,
}

/// Rule-based score set for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBasedScoreSet {
    pub summary: RuleBasedSummary,
    pub detailed_scores: DetailedScores,
}

/// Scorer applying the fixed weighted formulas plus the readiness ensemble
#[derive(Debug, Clone, Default)]
pub struct RuleBasedScorer {
    readiness: InterviewReadinessModel,
}

impl RuleBasedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, metrics: &SessionMetrics, windows: &[FusedWindow]) -> RuleBasedScoreSet {
        let (engagement, engagement_components) =
            engagement_score(metrics.engagement_metrics.eye_contact_ratio, windows);
        let (emotional_regulation, emotion_components) =
            emotional_regulation_score(&metrics.emotion_trajectory);
        let speech_pitches: Vec<f64> = metrics
            .timeline_arrays
            .speech_timeline
            .iter()
            .map(|point| point.pitch)
            .collect();
        let (speech_clarity, speech_components) = speech_clarity_score(
            metrics.speech_quality_metrics.average_pause_duration,
            metrics.speech_quality_metrics.speaking_rate_wpm,
            &speech_pitches,
        );
        let (content_relevance, content_components) = content_relevance_score(metrics, windows);

        let overall = overall_performance_score(
            engagement,
            emotional_regulation,
            speech_clarity,
            content_relevance,
        );
        let predictions = self.readiness.predict(windows);

        RuleBasedScoreSet {
            summary: RuleBasedSummary {
                engagement: round_to(engagement, 2),
                emotional_regulation: round_to(emotional_regulation, 2),
                speech_clarity: round_to(speech_clarity, 2),
                content_relevance: round_to(content_relevance, 2),
                overall_performance: round_to(overall, 2),
                confidence: predictions.confidence,
                communication_effectiveness: predictions.communication_effectiveness,
                interview_readiness: predictions.interview_readiness,
            },
            detailed_scores: DetailedScores {
                engagement: Scored {
                    score: round_to(engagement, 2),
                    components: engagement_components,
                },
                emotional_regulation: Scored {
                    score: round_to(emotional_regulation, 2),
                    components: emotion_components,
                },
                speech_clarity: Scored {
                    score: round_to(speech_clarity, 2),
                    components: speech_components,
                },
                content_relevance: Scored {
                    score: round_to(content_relevance, 2),
                    components: content_components,
                },
                model_predictions: predictions,
                weights: OVERALL_WEIGHTS,
            },
        }
    }
}

fn engagement_score(eye_contact_ratio: f64, windows: &[FusedWindow]) -> (f64, EngagementComponents) {
    let eye_contact = normalize_percent(eye_contact_ratio);

    let gaze_stability = if windows.is_empty() {
        DEFAULT_GAZE_STABILITY
    } else {
        let mut counts: BTreeMap<GazeDirection, usize> = BTreeMap::new();
        for window in windows {
            *counts.entry(window.gaze_direction).or_insert(0) += 1;
        }
        let total = windows.len() as f64;
        let dominant_ratio = counts.values().copied().max().unwrap_or(0) as f64 / total;
        let center_ratio =
            counts.get(&GazeDirection::Center).copied().unwrap_or(0) as f64 / total;
        (0.5 * dominant_ratio + 0.5 * center_ratio) * 100.0
    };

    let head_motion = mean_opt(
        &windows
            .iter()
            .map(|w| w.head_pose.total_motion())
            .collect::<Vec<_>>(),
    )
    .unwrap_or(DEFAULT_HEAD_MOTION);
    let head_motion_score = clamp(100.0 - head_motion * 1.5, 0.0, 100.0);

    let score = clamp(
        0.4 * eye_contact + 0.35 * gaze_stability + 0.25 * head_motion_score,
        0.0,
        100.0,
    );
    (
        score,
        EngagementComponents {
            eye_contact_score: round_to(eye_contact, 2),
            gaze_stability_score: round_to(gaze_stability, 2),
            head_motion_score: round_to(head_motion_score, 2),
        },
    )
}

fn emotional_regulation_score(trajectory: &[EmotionPoint]) -> (f64, EmotionalRegulationComponents) {
    if trajectory.len() < 2 {
        return (
            DEFAULT_EMOTIONAL_REGULATION,
            EmotionalRegulationComponents {
                dominant_emotion_variance: 0.0,
                average_emotion_variance: 0.0,
            },
        );
    }

    let mut dominant_scores = Vec::with_capacity(trajectory.len());
    let mut per_label: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for point in trajectory {
        if point.emotion_scores.is_empty() {
            continue;
        }
        let top = point
            .emotion_scores
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        dominant_scores.push(top);
        for (label, value) in &point.emotion_scores {
            per_label.entry(label.as_str()).or_default().push(*value);
        }
    }

    let dominant_variance = population_variance(&dominant_scores);
    let label_variances: Vec<f64> = per_label
        .values()
        .filter(|series| series.len() > 1)
        .map(|series| population_variance(series))
        .collect();
    let average_variance = mean(label_variances);

    let penalty = (dominant_variance * 280.0 + average_variance * 220.0).min(100.0);
    let score = clamp(100.0 - penalty, 0.0, 100.0);
    (
        score,
        EmotionalRegulationComponents {
            dominant_emotion_variance: round_to(dominant_variance, 6),
            average_emotion_variance: round_to(average_variance, 6),
        },
    )
}

fn speech_clarity_score(
    average_pause: f64,
    speaking_rate: f64,
    pitches: &[f64],
) -> (f64, SpeechClarityComponents) {
    let pause_score = clamp(100.0 - average_pause * 65.0, 0.0, 100.0);
    let speaking_rate_score = clamp(
        100.0 - ((speaking_rate - 135.0).abs() / 135.0) * 100.0,
        0.0,
        100.0,
    );
    let pitch_variance = population_variance(pitches);
    let pitch_variance_score = clamp(100.0 - pitch_variance / 9.0, 0.0, 100.0);

    let score = clamp(
        0.35 * pause_score + 0.45 * speaking_rate_score + 0.2 * pitch_variance_score,
        0.0,
        100.0,
    );
    (
        score,
        SpeechClarityComponents {
            pause_score: round_to(pause_score, 2),
            speaking_rate_score: round_to(speaking_rate_score, 2),
            pitch_variance_score: round_to(pitch_variance_score, 2),
            pitch_variance: round_to(pitch_variance, 4),
        },
    )
}

fn content_relevance_score(
    metrics: &SessionMetrics,
    windows: &[FusedWindow],
) -> (f64, ContentRelevanceComponents) {
    let labels = &metrics.segment_labels;
    let (source, count, raw) = if !labels.is_empty() {
        (
            RelevanceSource::SegmentLabels,
            labels.len(),
            mean(labels.iter().map(|l| l.text_relevance_score)),
        )
    } else {
        (
            RelevanceSource::FusedFeatureVectors,
            windows.len(),
            mean(windows.iter().map(|w| w.text_scores.semantic_relevance * 100.0)),
        )
    };
    let score = clamp(raw, 0.0, 100.0);
    (
        score,
        ContentRelevanceComponents {
            source,
            segment_count: count,
            avg_segment_relevance: round_to(score, 2),
        },
    )
}

fn overall_performance_score(
    engagement: f64,
    emotional_regulation: f64,
    speech_clarity: f64,
    content_relevance: f64,
) -> f64 {
    let w = OVERALL_WEIGHTS;
    clamp(
        engagement * w.engagement
            + emotional_regulation * w.emotional_regulation
            + speech_clarity * w.speech_clarity
            + content_relevance * w.content_relevance,
        0.0,
        100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::WindowAligner;
    use crate::metrics::SessionMetricsAggregator;
    use crate::types::{
        AudioSegmentFeature, EmotionScores, HeadPose, TextSegmentFeature, VideoFrameFeature,
    };
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_engagement_without_windows() {
        let mut metrics = SessionMetricsAggregator::aggregate(&[], &[]);
        metrics.engagement_metrics.eye_contact_ratio = 0.75;
        metrics.engagement_metrics.avg_head_stability = 0.85;

        let scores = RuleBasedScorer::new().score(&metrics, &[]);
        // 0.4*75 + 0.35*40 + 0.25*70
        assert!((scores.summary.engagement - 61.5).abs() < 1e-6);
        assert_eq!(
            scores.detailed_scores.engagement.components,
            EngagementComponents {
                eye_contact_score: 75.0,
                gaze_stability_score: 40.0,
                head_motion_score: 70.0,
            }
        );
    }

    #[test]
    fn test_eye_contact_percent_passthrough() {
        let (score, components) = engagement_score(82.0, &[]);
        assert_eq!(components.eye_contact_score, 82.0);
        assert!((score - (0.4 * 82.0 + 14.0 + 17.5)).abs() < 1e-9);
    }

    #[test]
    fn test_short_trajectory_regulation_is_fifty() {
        let point = EmotionPoint {
            timestamp: 0.0,
            dominant_emotion: "happy".to_string(),
            emotion_scores: EmotionScores::from([("happy".to_string(), 1.0)]),
        };
        let (score, components) = emotional_regulation_score(&[point]);
        assert_eq!(score, 50.0);
        assert_eq!(components.dominant_emotion_variance, 0.0);
        assert_eq!(emotional_regulation_score(&[]).0, 50.0);
    }

    #[test]
    fn test_regulation_penalizes_swings() {
        let point = |happy: f64| EmotionPoint {
            timestamp: 0.0,
            dominant_emotion: String::new(),
            emotion_scores: EmotionScores::from([
                ("happy".to_string(), happy),
                ("neutral".to_string(), 1.0 - happy),
            ]),
        };
        let steady = emotional_regulation_score(&[point(0.6), point(0.6), point(0.6)]).0;
        assert_eq!(steady, 100.0);

        // dominant scores 1.0 and 1.0 → 0 variance; labels swing 0↔1 → pvar 0.25 each
        let swinging = emotional_regulation_score(&[point(1.0), point(0.0)]);
        assert!((swinging.0 - (100.0 - 55.0)).abs() < 1e-9);
        assert_eq!(swinging.1.average_emotion_variance, 0.25);
    }

    #[test]
    fn test_speech_clarity_ideal_pace() {
        let (score, components) = speech_clarity_score(0.0, 135.0, &[150.0]);
        assert!((score - 100.0).abs() < 1e-9);
        assert_eq!(components.pitch_variance, 0.0);

        let (_, components) = speech_clarity_score(0.5, 135.0, &[100.0, 160.0]);
        // pvar of [100, 160] = 900
        assert_eq!(components.pitch_variance, 900.0);
        assert_eq!(components.pitch_variance_score, 0.0);
        assert_eq!(components.pause_score, 67.5);
    }

    #[test]
    fn test_content_relevance_sources() {
        let text = vec![TextSegmentFeature {
            start: 0.0,
            end: 1.0,
            semantic_relevance: 0.9,
            ..Default::default()
        }];
        let windows = WindowAligner::new(2.0, false).align(&[], &[], &text);
        let metrics = SessionMetricsAggregator::aggregate(&[], &windows);
        let (score, components) = content_relevance_score(&metrics, &windows);
        assert_eq!(components.source, RelevanceSource::SegmentLabels);
        assert_eq!(score, 90.0);

        let mut bare = metrics.clone();
        bare.segment_labels.clear();
        let (score, components) = content_relevance_score(&bare, &windows);
        assert_eq!(components.source, RelevanceSource::FusedFeatureVectors);
        assert!((score - 90.0).abs() < 1e-9);

        let (score, _) = content_relevance_score(&bare, &[]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_overall_weights() {
        let overall = overall_performance_score(80.0, 60.0, 70.0, 50.0);
        assert!((overall - (24.0 + 12.0 + 17.5 + 12.5)).abs() < 1e-9);
    }

    fn session_strategy() -> impl Strategy<
        Value = (
            Vec<VideoFrameFeature>,
            Vec<AudioSegmentFeature>,
            Vec<TextSegmentFeature>,
        ),
    > {
        let frame = (0.0f64..30.0, 0.0f64..1.0, -90.0f64..90.0, -90.0f64..90.0, 0u8..4, 0u8..2)
            .prop_map(|(timestamp, happy, yaw, pitch, gaze, eye)| VideoFrameFeature {
                timestamp,
                facial_emotion_scores: EmotionScores::from([
                    ("happy".to_string(), happy),
                    ("neutral".to_string(), 1.0 - happy),
                ]),
                head_pose: HeadPose { yaw, pitch, roll: 0.0 },
                gaze_direction: match gaze {
                    0 => GazeDirection::Center,
                    1 => GazeDirection::Left,
                    2 => GazeDirection::Right,
                    _ => GazeDirection::Unknown,
                },
                eye_contact: eye as f64,
            });
        let audio = (0.0f64..30.0, 0.0f64..5.0, 0.0f64..400.0, 0.0f64..3.0, 0.0f64..300.0)
            .prop_map(|(start, len, pitch, pause, rate)| AudioSegmentFeature {
                start,
                end: start + len,
                pitch,
                pause_duration: pause,
                speaking_rate: rate,
                ..Default::default()
            });
        let text = (0.0f64..30.0, 0.0f64..5.0, -1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
            .prop_map(|(start, len, relevance, sentiment, coherence)| TextSegmentFeature {
                start,
                end: start + len,
                semantic_relevance: relevance,
                sentiment_score: sentiment,
                answer_coherence: coherence,
            });
        (
            proptest::collection::vec(frame, 0..12),
            proptest::collection::vec(audio, 0..6),
            proptest::collection::vec(text, 0..6),
        )
    }

    proptest! {
        #[test]
        fn prop_rule_based_scores_are_bounded((video, audio, text) in session_strategy()) {
            let windows = WindowAligner::new(2.0, false).align(&video, &audio, &text);
            let metrics = SessionMetricsAggregator::aggregate(&video, &windows);
            let summary = RuleBasedScorer::new().score(&metrics, &windows).summary;

            for value in [
                summary.engagement,
                summary.emotional_regulation,
                summary.speech_clarity,
                summary.content_relevance,
                summary.overall_performance,
                summary.confidence,
                summary.communication_effectiveness,
                summary.interview_readiness,
            ] {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }
    }
}
