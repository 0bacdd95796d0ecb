//! Rule-based coaching feedback over the rule-based score set

use crate::metrics::cap_or_fallback;
use crate::scoring::{
    DetailedScores, EmotionalRegulationComponents, EngagementComponents, RuleBasedScoreSet,
    SpeechClarityComponents,
};
use serde::{Deserialize, Serialize};

const ENGAGEMENT_TARGET: f64 = 60.0;
const SPEECH_CLARITY_TARGET: f64 = 60.0;
const EMOTIONAL_REGULATION_TARGET: f64 = 60.0;
const CONTENT_RELEVANCE_TARGET: f64 = 65.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechDrivers {
    pub pause_score: f64,
    pub speaking_rate_score: f64,
    pub pitch_variance_score: f64,
}

/// Component breakdown echoed alongside the feedback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRationale {
    pub engagement_drivers: EngagementComponents,
    pub speech_drivers: SpeechDrivers,
    pub emotion_drivers: EmotionalRegulationComponents,
}

impl FeedbackRationale {
    fn from_detailed(detailed: &DetailedScores) -> Self {
        let SpeechClarityComponents {
            pause_score,
            speaking_rate_score,
            pitch_variance_score,
            ..
        } = detailed.speech_clarity.components;
        Self {
            engagement_drivers: detailed.engagement.components,
            speech_drivers: SpeechDrivers {
                pause_score,
                speaking_rate_score,
                pitch_variance_score,
            },
            emotion_drivers: detailed.emotional_regulation.components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
    pub feedback_messages: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub rationale: FeedbackRationale,
    pub suggested_feedback_text: String,
}

struct Check {
    score: f64,
    target: f64,
    improvement: &'static str,
    message: &'static str,
    strength: &'static str,
}

pub fn generate_feedback(scores: &RuleBasedScoreSet) -> FeedbackPayload {
    let summary = &scores.summary;
    let checks = [
        Check {
            score: summary.engagement,
            target: ENGAGEMENT_TARGET,
            improvement: "Improve eye contact consistency and reduce off-screen gaze to strengthen interviewer connection.",
            message: "Engagement is below target. Focus on stable gaze and calm head movement to improve presence.",
            strength: "You maintained strong engagement with stable visual focus.",
        },
        Check {
            score: summary.speech_clarity,
            target: SPEECH_CLARITY_TARGET,
            improvement: "Reduce long pauses and keep your speaking pace within a steady conversational range.",
            message: "Speech clarity can improve with smoother pacing and shorter silent gaps between ideas.",
            strength: "Speech delivery is clear with an effective pace.",
        },
        Check {
            score: summary.emotional_regulation,
            target: EMOTIONAL_REGULATION_TARGET,
            improvement: "Maintain a steadier emotional tone when discussing difficult topics.",
            message: "Emotional variation appears high. Try controlled breathing and brief pauses before key answers.",
            strength: "Emotional regulation is steady and professional.",
        },
        Check {
            score: summary.content_relevance,
            target: CONTENT_RELEVANCE_TARGET,
            improvement: "Increase answer relevance by aligning examples more directly with the question intent.",
            message: "Content relevance is moderate. Prioritize concise examples tied to role-specific outcomes.",
            strength: "Responses were well aligned with interview content expectations.",
        },
    ];

    let mut feedback_messages = Vec::new();
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    for check in &checks {
        if check.score < check.target {
            improvements.push(check.improvement.to_string());
            feedback_messages.push(check.message.to_string());
        } else {
            strengths.push(check.strength.to_string());
        }
    }

    let closing = if summary.overall_performance >= 80.0 {
        "Overall performance is strong. Keep this structure and polish deeper storytelling for top-tier delivery."
    } else if summary.overall_performance >= 65.0 {
        "Overall performance is solid with clear growth potential in targeted areas listed above."
    } else {
        "Overall performance is developing. Address the top improvement actions to quickly raise your score."
    };
    feedback_messages.push(closing.to_string());

    let strengths = cap_or_fallback(
        strengths,
        "You completed the interview session and produced analyzable responses.",
    );
    let improvements = cap_or_fallback(
        improvements,
        "Continue practicing scenario-specific examples to improve impact.",
    );
    let suggested_feedback_text = format!(
        "Strengths: {} Improvements: {}",
        strengths.join(" "),
        improvements.join(" ")
    );

    FeedbackPayload {
        feedback_messages,
        strengths,
        improvements,
        rationale: FeedbackRationale::from_detailed(&scores.detailed_scores),
        suggested_feedback_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SessionMetricsAggregator;
    use crate::scoring::RuleBasedScorer;

    fn score_set() -> RuleBasedScoreSet {
        let metrics = SessionMetricsAggregator::aggregate(&[], &[]);
        RuleBasedScorer::new().score(&metrics, &[])
    }

    #[test]
    fn test_low_scores_produce_improvements() {
        let mut scores = score_set();
        scores.summary.engagement = 40.0;
        scores.summary.speech_clarity = 50.0;
        scores.summary.emotional_regulation = 30.0;
        scores.summary.content_relevance = 10.0;
        scores.summary.overall_performance = 35.0;

        let feedback = generate_feedback(&scores);
        assert_eq!(feedback.improvements.len(), 3);
        assert_eq!(
            feedback.strengths,
            vec!["You completed the interview session and produced analyzable responses.".to_string()]
        );
        assert_eq!(feedback.feedback_messages.len(), 5);
        assert!(feedback
            .feedback_messages
            .last()
            .unwrap()
            .starts_with("Overall performance is developing."));
    }

    #[test]
    fn test_high_scores_produce_strengths() {
        let mut scores = score_set();
        scores.summary.engagement = 90.0;
        scores.summary.speech_clarity = 90.0;
        scores.summary.emotional_regulation = 60.0;
        scores.summary.content_relevance = 65.0;
        scores.summary.overall_performance = 82.0;

        let feedback = generate_feedback(&scores);
        assert_eq!(feedback.strengths.len(), 3);
        assert_eq!(
            feedback.improvements,
            vec!["Continue practicing scenario-specific examples to improve impact.".to_string()]
        );
        assert_eq!(feedback.feedback_messages.len(), 1);
        assert!(feedback.suggested_feedback_text.starts_with("Strengths: You maintained"));
        assert!(feedback.suggested_feedback_text.contains(" Improvements: Continue"));
    }

    #[test]
    fn test_rationale_echoes_components() {
        let scores = score_set();
        let feedback = generate_feedback(&scores);
        assert_eq!(
            feedback.rationale.engagement_drivers,
            scores.detailed_scores.engagement.components
        );
        assert_eq!(
            feedback.rationale.speech_drivers.pause_score,
            scores.detailed_scores.speech_clarity.components.pause_score
        );
    }
}
