//! Rubric mapping
//!
//! Maps the numeric score sets onto four qualitative interview dimensions.
//! Each dimension reads the first finite score from a fixed chain of sources.

use crate::encoder::AdvancedScores;
use crate::scoring::RuleBasedSummary;
use crate::stats::{clamp, round_to};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RubricLevel {
    Excellent,
    Good,
    NeedsImprovement,
}

impl RubricLevel {
    /// Lowest score that reaches this level
    pub fn min_score(&self) -> f64 {
        match self {
            RubricLevel::Excellent => 85.0,
            RubricLevel::Good => 70.0,
            RubricLevel::NeedsImprovement => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RubricLevel::Excellent => "Excellent",
            RubricLevel::Good => "Good",
            RubricLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Level for a 0-100 score (clamped first)
pub fn score_to_level(score: f64) -> RubricLevel {
    let value = clamp(score, 0.0, 100.0);
    [RubricLevel::Excellent, RubricLevel::Good]
        .into_iter()
        .find(|level| value >= level.min_score())
        .unwrap_or(RubricLevel::NeedsImprovement)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    Communication,
    TechnicalClarity,
    BehavioralResponse,
    Engagement,
}

impl RubricDimension {
    pub const ALL: [RubricDimension; 4] = [
        RubricDimension::Communication,
        RubricDimension::TechnicalClarity,
        RubricDimension::BehavioralResponse,
        RubricDimension::Engagement,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            RubricDimension::Communication => "Communication",
            RubricDimension::TechnicalClarity => "Technical Clarity",
            RubricDimension::BehavioralResponse => "Behavioral Response",
            RubricDimension::Engagement => "Engagement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RubricDimension::Communication => {
                "Clarity of verbal delivery and structured articulation of ideas."
            }
            RubricDimension::TechnicalClarity => {
                "Accuracy and depth when explaining technical decisions, tradeoffs, and outcomes."
            }
            RubricDimension::BehavioralResponse => {
                "Quality of examples, reflection, and behavioral framing under interview prompts."
            }
            RubricDimension::Engagement => {
                "Visible attentiveness and interview presence through gaze, posture, and interaction stability."
            }
        }
    }

    pub fn descriptor(&self, level: RubricLevel) -> &'static str {
        use RubricDimension::*;
        use RubricLevel::*;
        match (self, level) {
            (Communication, Excellent) => "Communicates ideas with clear structure, concise language, and strong audience alignment.",
            (Communication, Good) => "Communicates clearly with minor pacing or structure gaps that do not block understanding.",
            (Communication, NeedsImprovement) => "Communication is inconsistent; pacing, clarity, or structure frequently reduce impact.",
            (TechnicalClarity, Excellent) => "Explains technical concepts accurately with strong depth, tradeoffs, and measurable outcomes.",
            (TechnicalClarity, Good) => "Technical explanations are mostly correct with moderate depth and occasional missing details.",
            (TechnicalClarity, NeedsImprovement) => "Technical explanations are shallow or ambiguous; key reasoning and validation are missing.",
            (BehavioralResponse, Excellent) => "Behavioral examples are specific, reflective, and outcome-focused with clear ownership.",
            (BehavioralResponse, Good) => "Behavioral responses are relevant and understandable but can improve in specificity or impact.",
            (BehavioralResponse, NeedsImprovement) => "Behavioral responses are generic, lack clear structure, or miss tangible outcomes.",
            (Engagement, Excellent) => "Maintains strong engagement throughout with stable eye contact and controlled non-verbal cues.",
            (Engagement, Good) => "Shows consistent engagement with minor non-verbal variability.",
            (Engagement, NeedsImprovement) => "Engagement fluctuates; off-screen gaze or unstable non-verbal cues reduce interviewer connection.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricEntry {
    pub title: String,
    pub description: String,
    pub score: f64,
    pub level: RubricLevel,
    pub descriptor: String,
}

impl RubricEntry {
    pub fn new(dimension: RubricDimension, score: f64) -> Self {
        let level = score_to_level(score);
        Self {
            title: dimension.title().to_string(),
            description: dimension.description().to_string(),
            score: round_to(clamp(score, 0.0, 100.0), 2),
            level,
            descriptor: dimension.descriptor(level).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricEvaluation {
    pub communication: RubricEntry,
    pub technical_clarity: RubricEntry,
    pub behavioral_response: RubricEntry,
    pub engagement: RubricEntry,
}

impl RubricEvaluation {
    pub fn get(&self, dimension: RubricDimension) -> &RubricEntry {
        match dimension {
            RubricDimension::Communication => &self.communication,
            RubricDimension::TechnicalClarity => &self.technical_clarity,
            RubricDimension::BehavioralResponse => &self.behavioral_response,
            RubricDimension::Engagement => &self.engagement,
        }
    }
}

/// Map whichever score sets are available onto the rubric
pub fn map_scores_to_rubric(
    rule: Option<&RuleBasedSummary>,
    advanced: Option<&AdvancedScores>,
) -> RubricEvaluation {
    let communication = resolve(
        &[
            rule.map(|r| r.communication_effectiveness),
            advanced.map(|a| a.communication_clarity),
            rule.map(|r| r.speech_clarity),
        ],
        0.0,
    );
    let technical_clarity = resolve(
        &[
            advanced.map(|a| a.interview_comprehension),
            rule.map(|r| r.content_relevance),
            rule.map(|r| r.speech_clarity),
        ],
        0.0,
    );
    let behavioral_response = resolve(
        &[
            rule.map(|r| r.overall_performance),
            advanced.map(|a| a.overall_performance),
            rule.map(|r| r.emotional_regulation),
        ],
        0.0,
    );
    let engagement = resolve(
        &[rule.map(|r| r.engagement), advanced.map(|a| a.engagement)],
        50.0,
    );

    RubricEvaluation {
        communication: RubricEntry::new(RubricDimension::Communication, communication),
        technical_clarity: RubricEntry::new(RubricDimension::TechnicalClarity, technical_clarity),
        behavioral_response: RubricEntry::new(
            RubricDimension::BehavioralResponse,
            behavioral_response,
        ),
        engagement: RubricEntry::new(RubricDimension::Engagement, engagement),
    }
}

/// First finite candidate, clamped; `default` when none is usable
fn resolve(candidates: &[Option<f64>], default: f64) -> f64 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| value.is_finite())
        .map(|value| clamp(value, 0.0, 100.0))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(score_to_level(85.0), RubricLevel::Excellent);
        assert_eq!(score_to_level(84.999), RubricLevel::Good);
        assert_eq!(score_to_level(70.0), RubricLevel::Good);
        assert_eq!(score_to_level(69.99), RubricLevel::NeedsImprovement);
        assert_eq!(score_to_level(0.0), RubricLevel::NeedsImprovement);
        assert_eq!(score_to_level(140.0), RubricLevel::Excellent);
        assert_eq!(score_to_level(f64::NAN), RubricLevel::NeedsImprovement);
    }

    #[test]
    fn test_rule_scores_take_priority() {
        let rule = RuleBasedSummary {
            communication_effectiveness: 90.0,
            overall_performance: 72.0,
            engagement: 40.0,
            content_relevance: 66.0,
            ..Default::default()
        };
        let advanced = AdvancedScores::from_array([95.0, 10.0, 88.0, 20.0]);
        let rubric = map_scores_to_rubric(Some(&rule), Some(&advanced));

        assert_eq!(rubric.communication.score, 90.0);
        assert_eq!(rubric.communication.level, RubricLevel::Excellent);
        // advanced comprehension leads the technical chain
        assert_eq!(rubric.technical_clarity.score, 88.0);
        assert_eq!(rubric.behavioral_response.level, RubricLevel::Good);
        assert_eq!(rubric.engagement.level, RubricLevel::NeedsImprovement);
        assert_eq!(
            rubric.engagement.descriptor,
            "Engagement fluctuates; off-screen gaze or unstable non-verbal cues reduce interviewer connection."
        );
    }

    #[test]
    fn test_fallback_chain_skips_non_finite() {
        let rule = RuleBasedSummary {
            communication_effectiveness: f64::NAN,
            speech_clarity: 75.0,
            ..Default::default()
        };
        let advanced = AdvancedScores {
            communication_clarity: f64::INFINITY,
            ..Default::default()
        };
        let rubric = map_scores_to_rubric(Some(&rule), Some(&advanced));
        assert_eq!(rubric.communication.score, 75.0);
    }

    #[test]
    fn test_defaults_without_scores() {
        let rubric = map_scores_to_rubric(None, None);
        assert_eq!(rubric.engagement.score, 50.0);
        assert_eq!(rubric.communication.score, 0.0);
        assert_eq!(rubric.get(RubricDimension::TechnicalClarity).title, "Technical Clarity");
    }

    #[test]
    fn test_serialized_shape() {
        let rubric = map_scores_to_rubric(None, None);
        let value = serde_json::to_value(&rubric).unwrap();
        assert_eq!(value["technical_clarity"]["level"], "NeedsImprovement");
        assert_eq!(value["engagement"]["title"], "Engagement");
    }
}
