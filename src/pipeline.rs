//! Pipeline orchestration
//!
//! This module provides the public API for Interview Fusion.
//! It orchestrates the full pipeline from session feature JSON to a scored
//! session report.

use crate::adapter::{parse_session, SessionInput};
use crate::advanced::{build_embeddings, explain_scores, AdvancedScoreSet, AdvancedScorer, ScoreExplanation};
use crate::aligner::WindowAligner;
use crate::audit::{AuditState, BiasAuditReport, NeutralFairnessReport};
use crate::config::FusionConfig;
use crate::encoder::EncoderBackendKind;
use crate::error::ComputeError;
use crate::feedback::{generate_feedback, FeedbackPayload};
use crate::metrics::SessionMetricsAggregator;
use crate::rubric::{map_scores_to_rubric, RubricEvaluation};
use crate::scoring::{RuleBasedScoreSet, RuleBasedScorer};
use crate::types::{FusedWindow, SessionMetrics};
use crate::{FUSION_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Identity of the service instance that produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Everything computed for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub producer: Producer,
    pub computed_at_utc: String,
    pub session_id: String,
    pub fused_windows: Vec<FusedWindow>,
    pub session_metrics: SessionMetrics,
    pub rule_based_scores: RuleBasedScoreSet,
    pub advanced_scores: AdvancedScoreSet,
    pub score_explanations: Vec<ScoreExplanation>,
    pub rubric_evaluation: RubricEvaluation,
    pub feedback: FeedbackPayload,
    pub bias_audit: BiasAuditReport,
    pub fairness_report: NeutralFairnessReport,
}

/// Score one session JSON document with a fresh service.
///
/// Audit histories start empty, so fairness reports reflect this session only.
///
/// # Example
/// ```ignore
/// let report_json = analyze_session(session_json)?;
/// ```
pub fn analyze_session(json: String) -> Result<String, ComputeError> {
    let config = FusionConfig::default().with_env_overrides()?;
    ScoringService::new(config).process_json(&json)
}

/// Stateful scorer that keeps audit histories across sessions.
///
/// Callers sharing one service between threads must wrap it in a lock.
pub struct ScoringService {
    config: FusionConfig,
    aligner: WindowAligner,
    rule_scorer: RuleBasedScorer,
    advanced_scorer: AdvancedScorer,
    audits: AuditState,
    instance_id: String,
}

impl Default for ScoringService {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

impl ScoringService {
    /// Build every stage from `config`; learned transforms are seeded here once
    pub fn new(config: FusionConfig) -> Self {
        Self {
            aligner: WindowAligner::from_config(&config),
            rule_scorer: RuleBasedScorer::new(),
            advanced_scorer: AdvancedScorer::from_config(&config),
            audits: AuditState::new(
                config.neutral_history_capacity,
                config.sensitive_history_capacity,
            ),
            instance_id: Uuid::new_v4().to_string(),
            config,
        }
    }

    /// Use a specific producer instance ID
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.instance_id = instance_id;
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn encoder_backend(&self) -> EncoderBackendKind {
        self.advanced_scorer.encoder_backend()
    }

    pub fn learned_fusion_active(&self) -> bool {
        self.aligner.learned_fusion_active()
    }

    /// Align a session without scoring it
    pub fn align(&self, session: &SessionInput) -> Vec<FusedWindow> {
        self.aligner
            .align(&session.video, &session.audio, &session.text)
    }

    /// Run every stage on a parsed session and record it in the audit histories
    pub fn process(&mut self, session: &SessionInput) -> SessionReport {
        let fused_windows = self.align(session);
        let session_metrics = SessionMetricsAggregator::aggregate(&session.video, &fused_windows);

        let rule_based_scores = self.rule_scorer.score(&session_metrics, &fused_windows);
        let advanced_scores = self.advanced_scorer.score(&session_metrics, &fused_windows);
        let embeddings = build_embeddings(&session_metrics, &fused_windows);
        let score_explanations =
            explain_scores(&advanced_scores.scores, &session_metrics, &embeddings);

        let rubric_evaluation = map_scores_to_rubric(
            Some(&rule_based_scores.summary),
            Some(&advanced_scores.scores),
        );
        let feedback = generate_feedback(&rule_based_scores);

        let bias_audit = self
            .audits
            .bias
            .audit(&session.context, rule_based_scores.summary.overall_performance);
        let fairness_report = self.audits.neutral.analyze(
            &session.session_id,
            &advanced_scores.scores,
            &session_metrics,
        );

        info!(
            session_id = %session.session_id,
            windows = fused_windows.len(),
            overall = rule_based_scores.summary.overall_performance,
            encoder = self.encoder_backend().as_str(),
            audit_warnings = bias_audit.warnings.len() + fairness_report.warnings.len(),
            "scored session"
        );

        SessionReport {
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: FUSION_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            session_id: session.session_id.clone(),
            fused_windows,
            session_metrics,
            rule_based_scores,
            advanced_scores,
            score_explanations,
            rubric_evaluation,
            feedback,
            bias_audit,
            fairness_report,
        }
    }

    /// Parse, score and encode one session as pretty JSON
    pub fn process_json(&mut self, json: &str) -> Result<String, ComputeError> {
        let session = parse_session(json)?;
        let report = self.process(&session);
        serde_json::to_string_pretty(&report).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Load both audit histories from JSON
    pub fn load_audit_history(&mut self, json: &str) -> Result<(), ComputeError> {
        self.audits = AuditState::from_json(
            json,
            self.config.neutral_history_capacity,
            self.config.sensitive_history_capacity,
        )?;
        Ok(())
    }

    /// Save both audit histories to JSON
    pub fn save_audit_history(&self) -> Result<String, ComputeError> {
        self.audits.to_json()
    }

    pub fn clear_audit_history(&mut self) {
        self.audits.clear();
    }

    /// `(neutral, sensitive)` history sizes
    pub fn audit_sample_counts(&self) -> (usize, usize) {
        (
            self.audits.neutral.sample_count(),
            self.audits.bias.sample_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::SCORE_KEYS;

    fn sample_session_json() -> &'static str {
        r#"{
            "sessionId": "sess-42",
            "video": [
                {"timestamp": 0.0, "facialEmotionScores": {"happy": 0.6, "neutral": 0.4},
                 "headPose": {"yaw": 4.0, "pitch": 2.0, "roll": 1.0}, "gazeDirection": "center", "eyeContact": 1.0},
                {"timestamp": 1.0, "facialEmotionScores": {"happy": 0.5, "neutral": 0.5},
                 "headPose": {"yaw": 6.0, "pitch": 1.0, "roll": 0.0}, "gazeDirection": "center", "eyeContact": 1.0},
                {"timestamp": 2.5, "facialEmotionScores": {"neutral": 0.8, "sad": 0.2},
                 "headPose": {"yaw": 12.0, "pitch": 3.0, "roll": 2.0}, "gazeDirection": "left", "eyeContact": 0.0},
                {"timestamp": 3.5, "facialEmotionScores": {"happy": 0.7, "neutral": 0.3},
                 "headPose": {"yaw": 2.0, "pitch": 0.0, "roll": 1.0}, "gazeDirection": "center", "eyeContact": 1.0}
            ],
            "audio": [
                {"start": 0.0, "end": 2.0, "pitch": 145.0, "pauseDuration": 0.3, "speakingRate": 128.0,
                 "prosody": {"logMelStd": 0.62}},
                {"start": 2.0, "end": 4.0, "pitch": 152.0, "pauseDuration": 0.5, "speakingRate": 141.0,
                 "prosody": {"logMelStd": 0.58}}
            ],
            "text": [
                {"start": 0.0, "end": 4.0, "semanticRelevance": 0.82, "sentimentScore": 0.3, "answerCoherence": 0.76}
            ],
            "context": {"accent": "regional", "lighting_condition": "dim"}
        }"#
    }

    #[test]
    fn test_analyze_session() {
        let result = analyze_session(sample_session_json().to_string());
        assert!(result.is_ok());

        let report: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();
        assert_eq!(report["sessionId"], "sess-42");
        assert_eq!(report["producer"]["name"], PRODUCER_NAME);
        assert_eq!(report["fusedWindows"].as_array().unwrap().len(), 3);
        for key in SCORE_KEYS {
            let value = report["advancedScores"][key].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&value));
        }
        assert!(report["ruleBasedScores"]["summary"]["overallPerformance"].is_number());
        assert_eq!(report["scoreExplanations"].as_array().unwrap().len(), 4);
        assert!(report["rubricEvaluation"]["communication"]["level"].is_string());
        assert_eq!(
            report["biasAudit"]["checkedSensitiveAttributes"],
            serde_json::json!(["accent"])
        );
        assert_eq!(report["fairnessReport"]["sampleCount"], 1);
    }

    #[test]
    fn test_service_accumulates_audit_history() {
        let mut service = ScoringService::new(FusionConfig::default());
        for _ in 0..3 {
            service.process_json(sample_session_json()).unwrap();
        }
        assert_eq!(service.audit_sample_counts(), (3, 3));

        let saved = service.save_audit_history().unwrap();
        service.clear_audit_history();
        assert_eq!(service.audit_sample_counts(), (0, 0));

        service.load_audit_history(&saved).unwrap();
        assert_eq!(service.audit_sample_counts(), (3, 3));
    }

    #[test]
    fn test_loaded_history_respects_configured_capacity() {
        let mut large = ScoringService::default();
        for _ in 0..5 {
            large.process_json(sample_session_json()).unwrap();
        }
        let saved = large.save_audit_history().unwrap();

        let mut small = ScoringService::new(FusionConfig {
            neutral_history_capacity: 2,
            sensitive_history_capacity: 4,
            ..Default::default()
        });
        small.load_audit_history(&saved).unwrap();
        assert_eq!(small.audit_sample_counts(), (2, 4));
    }

    #[test]
    fn test_empty_session() {
        let mut service = ScoringService::default().with_instance_id("fixed".to_string());
        let report = service.process(&SessionInput::default());

        assert_eq!(report.producer.instance_id, "fixed");
        assert_eq!(report.fused_windows.len(), 1);
        assert_eq!(report.rule_based_scores.summary.emotional_regulation, 50.0);
        assert!(report.bias_audit.checked_sensitive_attributes.is_empty());
    }

    #[test]
    fn test_linear_fallback_config() {
        let service = ScoringService::new(FusionConfig {
            use_attention_encoder: false,
            ..Default::default()
        });
        assert_eq!(service.encoder_backend(), EncoderBackendKind::LinearFallback);
        assert!(!service.learned_fusion_active());
    }

    #[test]
    fn test_invalid_json() {
        let mut service = ScoringService::default();
        assert!(matches!(
            service.process_json("not valid json"),
            Err(ComputeError::ParseError(_))
        ));
        assert!(matches!(
            service.load_audit_history("{"),
            Err(ComputeError::HistoryError(_))
        ));
    }
}
