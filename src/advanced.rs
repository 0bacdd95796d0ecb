//! Ensemble advanced scoring
//!
//! Builds vision, audio and text embeddings from the session metrics, runs
//! four fixed regression heads over their concatenation, and blends the heads
//! with the configured encoder backend.

use crate::config::{FusionConfig, DEFAULT_MODEL_SEED};
use crate::encoder::{
    create_score_encoder, AdvancedScores, EncoderBackendKind, Embedding, ModalityEmbeddings,
    ScoreEncoderHandle,
};
use crate::regression::RegressionHead;
use crate::stats::{clamp, clamp01, mean, normalize_percent, population_variance, round_to};
use crate::types::{FusedWindow, SessionMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share of the regression heads in the final blend (the encoder gets the rest)
const REGRESSION_SHARE: f64 = 0.45;

const DEFAULT_CENTER_RATIO: f64 = 0.5;
const DEFAULT_HEAD_MOTION: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedDiagnostics {
    pub regression_head_scores: AdvancedScores,
    pub encoder_scores: AdvancedScores,
    pub encoder_backend: EncoderBackendKind,
    pub modality_embeddings: ModalityEmbeddings,
}

/// Advanced score set for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedScoreSet {
    #[serde(flatten)]
    pub scores: AdvancedScores,
    pub diagnostics: AdvancedDiagnostics,
}

/// Human-readable account of one advanced score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreExplanation {
    pub score_key: String,
    pub score_value: f64,
    pub explanation: String,
    pub drivers: BTreeMap<String, f64>,
}

/// Regression + encoder ensemble
pub struct AdvancedScorer {
    engagement: RegressionHead,
    communication: RegressionHead,
    comprehension: RegressionHead,
    overall: RegressionHead,
    encoder: ScoreEncoderHandle,
}

impl Default for AdvancedScorer {
    fn default() -> Self {
        Self::new(EncoderBackendKind::Attention, DEFAULT_MODEL_SEED)
    }
}

impl AdvancedScorer {
    pub fn new(backend: EncoderBackendKind, seed: u64) -> Self {
        Self::with_encoder(create_score_encoder(backend, seed))
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        let backend = if config.use_attention_encoder {
            EncoderBackendKind::Attention
        } else {
            EncoderBackendKind::LinearFallback
        };
        Self::new(backend, config.seed)
    }

    /// Use a caller-supplied encoder backend
    pub fn with_encoder(encoder: ScoreEncoderHandle) -> Self {
        // [vision(4), audio(4), text(4)]
        Self {
            engagement: RegressionHead::new(
                &[0.9, 0.65, 0.55, 0.25, 0.15, 0.18, 0.08, 0.12, 0.2, 0.15, 0.2, 0.18],
                -0.72,
            ),
            communication: RegressionHead::new(
                &[0.22, 0.18, 0.2, 0.08, 0.68, 0.75, 0.42, 0.66, 0.3, 0.34, 0.2, 0.24],
                -0.78,
            ),
            comprehension: RegressionHead::new(
                &[0.18, 0.2, 0.12, 0.06, 0.2, 0.28, 0.16, 0.14, 0.74, 0.62, 0.5, 0.7],
                -0.8,
            ),
            overall: RegressionHead::new(
                &[0.36, 0.3, 0.26, 0.12, 0.34, 0.36, 0.24, 0.3, 0.42, 0.38, 0.31, 0.36],
                -0.84,
            ),
            encoder,
        }
    }

    pub fn encoder_backend(&self) -> EncoderBackendKind {
        self.encoder.backend()
    }

    pub fn score(&self, metrics: &SessionMetrics, windows: &[FusedWindow]) -> AdvancedScoreSet {
        let embeddings = build_embeddings(metrics, windows);
        let combined = embeddings.concat();

        let regression = AdvancedScores {
            engagement: self.engagement.predict(&combined),
            communication_clarity: self.communication.predict(&combined),
            interview_comprehension: self.comprehension.predict(&combined),
            overall_performance: self.overall.predict(&combined),
        };
        let encoded = self.encoder.encode(&embeddings);

        let scores = regression.zip_with(&encoded, |r, e| {
            round_to(
                clamp(REGRESSION_SHARE * r + (1.0 - REGRESSION_SHARE) * e, 0.0, 100.0),
                2,
            )
        });

        AdvancedScoreSet {
            scores,
            diagnostics: AdvancedDiagnostics {
                regression_head_scores: regression.map(|v| round_to(v, 2)),
                encoder_scores: encoded.map(|v| round_to(v, 2)),
                encoder_backend: self.encoder.backend(),
                modality_embeddings: embeddings.map(|v| round_to(v, 4)),
            },
        }
    }
}

/// Vision, audio and text embeddings from the aggregated session
pub fn build_embeddings(metrics: &SessionMetrics, windows: &[FusedWindow]) -> ModalityEmbeddings {
    ModalityEmbeddings {
        vision: vision_embedding(metrics, windows),
        audio: audio_embedding(metrics, windows),
        text: text_embedding(metrics, windows),
    }
}

fn vision_embedding(metrics: &SessionMetrics, windows: &[FusedWindow]) -> Embedding {
    let engagement = &metrics.engagement_metrics;
    let eye_contact = normalize_percent(engagement.eye_contact_ratio) / 100.0;
    let overall = normalize_percent(engagement.overall_engagement) / 100.0;

    let (center_ratio, head_motion) = if windows.is_empty() {
        (DEFAULT_CENTER_RATIO, DEFAULT_HEAD_MOTION)
    } else {
        let centered = windows.iter().filter(|w| w.gaze_direction.is_center()).count();
        (
            centered as f64 / windows.len() as f64,
            mean(windows.iter().map(|w| w.head_pose.total_motion())),
        )
    };

    [
        eye_contact,
        overall,
        center_ratio,
        clamp01(1.0 - head_motion / 30.0),
    ]
}

fn audio_embedding(metrics: &SessionMetrics, windows: &[FusedWindow]) -> Embedding {
    let speech = &metrics.speech_quality_metrics;
    let pitches: Vec<f64> = windows.iter().map(|w| w.speech_features.pitch).collect();
    [
        clamp01(1.0 - (speech.speaking_rate_wpm - 135.0).abs() / 135.0),
        clamp01(1.0 - speech.average_pause_duration / 1.4),
        clamp01(speech.prosody_score),
        clamp01(1.0 - population_variance(&pitches) / 220.0),
    ]
}

fn text_embedding(metrics: &SessionMetrics, windows: &[FusedWindow]) -> Embedding {
    let relevance = mean(metrics.segment_labels.iter().map(|l| l.text_relevance_score)) / 100.0;
    let semantic = mean(windows.iter().map(|w| w.text_scores.semantic_relevance));
    let coherence = mean(windows.iter().map(|w| w.text_scores.answer_coherence));
    let sentiment = mean(windows.iter().map(|w| w.text_scores.sentiment_score));
    [
        relevance,
        semantic,
        coherence,
        clamp01((sentiment + 1.0) / 2.0),
    ]
}

/// Template explanation per advanced score key
pub fn explain_scores(
    scores: &AdvancedScores,
    metrics: &SessionMetrics,
    embeddings: &ModalityEmbeddings,
) -> Vec<ScoreExplanation> {
    let eye_contact = normalize_percent(metrics.engagement_metrics.eye_contact_ratio);
    let head_stability = metrics.engagement_metrics.avg_head_stability;
    let speaking_rate = metrics.speech_quality_metrics.speaking_rate_wpm;
    let pause = metrics.speech_quality_metrics.average_pause_duration;
    let relevance = mean(metrics.segment_labels.iter().map(|l| l.text_relevance_score));
    let semantic = embeddings.text[1];
    let coherence = embeddings.text[2];

    let drivers = |pairs: &[(&str, f64)]| -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    };
    let modality_mean = |embedding: &Embedding| round_to(mean(embedding.iter().copied()), 4);

    vec![
        ScoreExplanation {
            score_key: "engagement".to_string(),
            score_value: round_to(scores.engagement, 2),
            explanation: format!(
                "Candidate maintained {:.1}% eye contact with head stability near {:.2}, which strongly influenced engagement scoring.",
                eye_contact, head_stability
            ),
            drivers: drivers(&[
                ("eyeContactPercent", round_to(eye_contact, 2)),
                ("headStability", round_to(head_stability, 4)),
            ]),
        },
        ScoreExplanation {
            score_key: "communicationClarity".to_string(),
            score_value: round_to(scores.communication_clarity, 2),
            explanation: format!(
                "Speech clarity reflects speaking rate around {:.1} wpm with average pauses of {:.2}s.",
                speaking_rate, pause
            ),
            drivers: drivers(&[
                ("speakingRateWpm", round_to(speaking_rate, 2)),
                ("averagePauseDuration", round_to(pause, 3)),
            ]),
        },
        ScoreExplanation {
            score_key: "interviewComprehension".to_string(),
            score_value: round_to(scores.interview_comprehension, 2),
            explanation: format!(
                "Comprehension combines transcript relevance ({:.1}) with semantic alignment ({:.2}) and answer coherence ({:.2}).",
                relevance, semantic, coherence
            ),
            drivers: drivers(&[
                ("avgTextRelevance", round_to(relevance, 2)),
                ("semanticRelevance", round_to(semantic, 4)),
                ("answerCoherence", round_to(coherence, 4)),
            ]),
        },
        ScoreExplanation {
            score_key: "overallPerformance".to_string(),
            score_value: round_to(scores.overall_performance, 2),
            explanation: "Overall performance is derived from fused vision/audio/text embeddings."
                .to_string(),
            drivers: drivers(&[
                ("visionEmbeddingMean", modality_mean(&embeddings.vision)),
                ("audioEmbeddingMean", modality_mean(&embeddings.audio)),
                ("textEmbeddingMean", modality_mean(&embeddings.text)),
            ]),
        },
    ]
}
