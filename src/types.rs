//! Core types for the Interview Fusion pipeline
//!
//! This module defines the records that flow through each stage of the
//! pipeline: per-modality input features, fused windows, and the derived
//! session-level metrics consumed by the scorers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotion label → score map. Ordered so every argmax tie-break is stable.
pub type EmotionScores = BTreeMap<String, f64>;

/// Length of the per-window fused feature vector
pub const FUSED_VECTOR_LEN: usize = 10;

/// Fixed-length fused feature vector
pub type FusedVector = [f64; FUSED_VECTOR_LEN];

/// Coarse gaze direction reported by the facial model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GazeDirection {
    Left,
    Center,
    Right,
    #[serde(other)]
    Unknown,
}

impl Default for GazeDirection {
    fn default() -> Self {
        GazeDirection::Unknown
    }
}

impl GazeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeDirection::Left => "left",
            GazeDirection::Center => "center",
            GazeDirection::Right => "right",
            GazeDirection::Unknown => "unknown",
        }
    }

    /// Tie-break priority when two directions are equally frequent (lower wins)
    pub fn tie_break_rank(&self) -> u8 {
        match self {
            GazeDirection::Center => 0,
            GazeDirection::Left => 1,
            GazeDirection::Right => 2,
            GazeDirection::Unknown => 3,
        }
    }

    pub fn is_center(&self) -> bool {
        matches!(self, GazeDirection::Center)
    }
}

/// Head orientation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadPose {
    /// Sum of absolute rotation on all three axes
    pub fn total_motion(&self) -> f64 {
        self.yaw.abs() + self.pitch.abs() + self.roll.abs()
    }
}

/// One sampled video frame from the facial/gaze model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoFrameFeature {
    /// Seconds from session start
    pub timestamp: f64,
    pub facial_emotion_scores: EmotionScores,
    pub head_pose: HeadPose,
    pub gaze_direction: GazeDirection,
    /// 1.0 when the candidate looks into the camera, else 0.0
    pub eye_contact: f64,
}

/// Prosodic summary of an audio segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Prosody {
    pub log_mel_std: f64,
}

/// One transcribed audio segment from the acoustic model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioSegmentFeature {
    pub start: f64,
    pub end: f64,
    /// Mean fundamental frequency (Hz)
    pub pitch: f64,
    /// Mean pause length inside the segment (seconds)
    pub pause_duration: f64,
    /// Words per minute
    pub speaking_rate: f64,
    pub prosody: Prosody,
    pub speech_emotion_scores: EmotionScores,
}

/// One transcript segment from the text model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextSegmentFeature {
    pub start: f64,
    pub end: f64,
    /// Cosine similarity to the question, -1..1
    pub semantic_relevance: f64,
    /// -1..1
    pub sentiment_score: f64,
    /// -1..1
    pub answer_coherence: f64,
}

/// Mean speech features of the audio segments overlapping a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechFeatures {
    pub pitch: f64,
    pub pause_duration: f64,
    pub speaking_rate: f64,
    pub prosody_score: f64,
}

/// Mean text scores of the transcript segments overlapping a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextScores {
    pub semantic_relevance: f64,
    pub sentiment_score: f64,
    pub answer_coherence: f64,
}

/// A fixed-duration, half-open `[start_time, end_time)` bucket with every
/// modality aggregated into it. Never mutated after alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedWindow {
    pub start_time: f64,
    pub end_time: f64,
    pub facial_emotion_scores: EmotionScores,
    pub head_pose: HeadPose,
    pub gaze_direction: GazeDirection,
    pub speech_features: SpeechFeatures,
    pub text_scores: TextScores,
    pub fused_vector: FusedVector,
}

impl FusedWindow {
    pub fn midpoint(&self) -> f64 {
        (self.start_time + self.end_time) / 2.0
    }

    pub fn emotion(&self, label: &str) -> f64 {
        self.facial_emotion_scores.get(label).copied().unwrap_or(0.0)
    }
}

/// One point of the per-frame emotion trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionPoint {
    pub timestamp: f64,
    pub dominant_emotion: String,
    pub emotion_scores: EmotionScores,
}

/// Session-wide visual engagement metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// 0-1
    pub overall_engagement: f64,
    /// 0-1
    pub eye_contact_ratio: f64,
    /// 0-1
    pub avg_head_stability: f64,
    pub avg_speaking_rate_wpm: f64,
}

/// Session-wide speech quality metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechQualityMetrics {
    pub average_pitch: f64,
    pub average_pause_duration: f64,
    pub speaking_rate_wpm: f64,
    pub prosody_score: f64,
}

/// Per-window label used for segment-level explanations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLabel {
    pub segment_id: String,
    pub label: String,
    pub start_time: f64,
    pub end_time: f64,
    /// 0-100
    pub engagement_score: f64,
    /// 0-100
    pub speech_fluency: f64,
    /// 0-100
    pub text_relevance_score: f64,
    pub dominant_emotion: String,
    pub emotion_averages: EmotionScores,
    pub speech_quality_metrics: SpeechFeatures,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementTimelinePoint {
    pub timestamp: f64,
    pub engagement: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechTimelinePoint {
    pub timestamp: f64,
    pub speaking_rate: f64,
    pub pitch: f64,
    pub pause_duration: f64,
    pub fluency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeHeadPosePoint {
    pub timestamp: f64,
    pub head_yaw: f64,
    pub head_pitch: f64,
    pub head_roll: f64,
    /// 0-100
    pub eye_contact: f64,
    pub gaze_direction: GazeDirection,
}

/// Time series rendered by report timelines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineArrays {
    pub emotion_timeline: Vec<EmotionPoint>,
    pub engagement_timeline: Vec<EngagementTimelinePoint>,
    pub speech_timeline: Vec<SpeechTimelinePoint>,
    pub gaze_head_pose_timeline: Vec<GazeHeadPosePoint>,
}

/// Quick fusion-level summary used by the feedback summary (all 0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionSummaryScores {
    pub engagement_score: f64,
    pub confidence_score: f64,
    pub speech_fluency: f64,
    pub emotional_stability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggested_feedback_text: String,
}

/// Everything the aggregator derives from one aligned session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub engagement_metrics: EngagementMetrics,
    pub emotion_trajectory: Vec<EmotionPoint>,
    pub speech_quality_metrics: SpeechQualityMetrics,
    pub summary_scores: FusionSummaryScores,
    pub segment_labels: Vec<SegmentLabel>,
    pub timeline_arrays: TimelineArrays,
    pub feedback_summary: FeedbackSummary,
}
