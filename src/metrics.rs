//! Session metric aggregation
//!
//! Derives session-level summaries from the raw video frames and the aligned
//! windows:
//! - Per-frame emotion trajectory
//! - Engagement and speech quality metrics
//! - Segment labels and timeline arrays for reporting
//! - A quick fusion-level summary and the strengths/improvements it implies

use crate::stats::{clamp01, mean, pause_quality, rate_quality, round_to, sentiment_norm};
use crate::types::{
    EmotionPoint, EmotionScores, EngagementMetrics, EngagementTimelinePoint, FeedbackSummary,
    FusedWindow, FusionSummaryScores, GazeHeadPosePoint, SegmentLabel, SessionMetrics,
    SpeechQualityMetrics, SpeechTimelinePoint, TimelineArrays, VideoFrameFeature,
};

/// Speaking rate treated as fully engaged (wpm)
const ENGAGED_SPEAKING_RATE: f64 = 140.0;

/// Summary scores at or above this are reported as strengths
const STRENGTH_THRESHOLD: f64 = 70.0;

const MAX_FEEDBACK_ITEMS: usize = 3;

/// Aggregator for session-level metrics
pub struct SessionMetricsAggregator;

impl SessionMetricsAggregator {
    /// Aggregate raw frames and aligned windows into session metrics
    pub fn aggregate(video: &[VideoFrameFeature], windows: &[FusedWindow]) -> SessionMetrics {
        let emotion_trajectory = emotion_trajectory(video);
        let engagement_metrics = engagement_metrics(video, windows);
        let speech_quality_metrics = speech_quality_metrics(windows);
        let summary_scores = summary_scores(&engagement_metrics, &speech_quality_metrics, windows);
        let segment_labels = segment_labels(windows);
        let timeline_arrays = timeline_arrays(video, &emotion_trajectory, windows);
        let feedback_summary =
            feedback_summary(&summary_scores, &speech_quality_metrics, &engagement_metrics);

        SessionMetrics {
            engagement_metrics,
            emotion_trajectory,
            speech_quality_metrics,
            summary_scores,
            segment_labels,
            timeline_arrays,
            feedback_summary,
        }
    }
}

/// Label with the highest score; ties go to the lexicographically first label
pub fn dominant_emotion(scores: &EmotionScores) -> String {
    let mut best: Option<(&String, f64)> = None;
    for (label, score) in scores {
        match best {
            Some((_, top)) if *score <= top => {}
            _ => best = Some((label, *score)),
        }
    }
    best.map(|(label, _)| label.clone())
        .unwrap_or_else(|| "neutral".to_string())
}

fn emotion_trajectory(video: &[VideoFrameFeature]) -> Vec<EmotionPoint> {
    if video.is_empty() {
        return vec![EmotionPoint {
            timestamp: 0.0,
            dominant_emotion: "neutral".to_string(),
            emotion_scores: EmotionScores::from([("neutral".to_string(), 1.0)]),
        }];
    }
    video
        .iter()
        .map(|frame| EmotionPoint {
            timestamp: frame.timestamp,
            dominant_emotion: dominant_emotion(&frame.facial_emotion_scores),
            emotion_scores: frame.facial_emotion_scores.clone(),
        })
        .collect()
}

fn engagement_metrics(video: &[VideoFrameFeature], windows: &[FusedWindow]) -> EngagementMetrics {
    let eye_contact_ratio = mean(video.iter().map(|f| f.eye_contact));
    let avg_head_stability = mean(
        video
            .iter()
            .map(|f| 1.0 / (1.0 + f.head_pose.yaw.abs() + f.head_pose.pitch.abs())),
    );
    let avg_speaking_rate_wpm = mean(windows.iter().map(|w| w.speech_features.speaking_rate));

    let rate_component = if avg_speaking_rate_wpm > 0.0 {
        (avg_speaking_rate_wpm / ENGAGED_SPEAKING_RATE).min(1.0)
    } else {
        0.0
    };
    let overall_engagement =
        clamp01(0.5 * eye_contact_ratio + 0.3 * avg_head_stability + 0.2 * rate_component);

    EngagementMetrics {
        overall_engagement,
        eye_contact_ratio,
        avg_head_stability,
        avg_speaking_rate_wpm,
    }
}

fn speech_quality_metrics(windows: &[FusedWindow]) -> SpeechQualityMetrics {
    SpeechQualityMetrics {
        average_pitch: mean(windows.iter().map(|w| w.speech_features.pitch)),
        average_pause_duration: mean(windows.iter().map(|w| w.speech_features.pause_duration)),
        speaking_rate_wpm: mean(windows.iter().map(|w| w.speech_features.speaking_rate)),
        prosody_score: mean(windows.iter().map(|w| w.speech_features.prosody_score)),
    }
}

fn summary_scores(
    engagement: &EngagementMetrics,
    speech: &SpeechQualityMetrics,
    windows: &[FusedWindow],
) -> FusionSummaryScores {
    let eye_contact = clamp01(engagement.eye_contact_ratio);
    let head_stability = clamp01(engagement.avg_head_stability);
    let sentiment = sentiment_norm(mean(windows.iter().map(|w| w.text_scores.sentiment_score)));
    let confidence = clamp01(0.45 * eye_contact + 0.25 * head_stability + 0.3 * sentiment);

    let fluency = clamp01(
        0.7 * rate_quality(speech.speaking_rate_wpm)
            + 0.3 * pause_quality(speech.average_pause_duration),
    );

    let emotional_stability = if windows.is_empty() {
        0.5
    } else {
        clamp01(mean(windows.iter().map(|w| clamp01(w.emotion("neutral")))))
    };

    FusionSummaryScores {
        engagement_score: to_percent(clamp01(engagement.overall_engagement)),
        confidence_score: to_percent(confidence),
        speech_fluency: to_percent(fluency),
        emotional_stability: to_percent(emotional_stability),
    }
}

fn segment_labels(windows: &[FusedWindow]) -> Vec<SegmentLabel> {
    windows
        .iter()
        .enumerate()
        .map(|(idx, window)| {
            let n = idx + 1;
            let speech = window.speech_features;
            let sentiment = sentiment_norm(window.text_scores.sentiment_score);
            let engagement = clamp01(
                0.4 * window.emotion("happy") + 0.3 * window.emotion("neutral") + 0.3 * sentiment,
            );
            let fluency = clamp01(
                0.8 * rate_quality(speech.speaking_rate) + 0.2 * pause_quality(speech.pause_duration),
            );

            SegmentLabel {
                segment_id: format!("segment_{}", n),
                label: format!("Question Segment {}", n),
                start_time: window.start_time,
                end_time: window.end_time,
                engagement_score: to_percent(engagement),
                speech_fluency: to_percent(fluency),
                text_relevance_score: to_percent(clamp01(window.text_scores.semantic_relevance)),
                dominant_emotion: dominant_emotion(&window.facial_emotion_scores),
                emotion_averages: window.facial_emotion_scores.clone(),
                speech_quality_metrics: speech,
            }
        })
        .collect()
}

fn timeline_arrays(
    video: &[VideoFrameFeature],
    trajectory: &[EmotionPoint],
    windows: &[FusedWindow],
) -> TimelineArrays {
    let engagement_timeline = windows
        .iter()
        .map(|window| {
            let center = if window.gaze_direction.is_center() { 1.0 } else { 0.0 };
            let yaw_steadiness = clamp01(1.0 - (window.head_pose.yaw.abs() / 45.0).min(1.0));
            let confidence = clamp01(
                0.4 * center
                    + 0.2 * yaw_steadiness
                    + 0.4 * sentiment_norm(window.text_scores.sentiment_score),
            );
            EngagementTimelinePoint {
                timestamp: round_to(window.midpoint(), 3),
                engagement: to_percent(clamp01(
                    window.fused_vector[0] + 0.2 * window.emotion("neutral"),
                )),
                confidence: to_percent(confidence),
            }
        })
        .collect();

    let speech_timeline = windows
        .iter()
        .map(|window| SpeechTimelinePoint {
            timestamp: round_to(window.midpoint(), 3),
            speaking_rate: window.speech_features.speaking_rate,
            pitch: window.speech_features.pitch,
            pause_duration: window.speech_features.pause_duration,
            fluency: to_percent(rate_quality(window.speech_features.speaking_rate)),
        })
        .collect();

    let gaze_head_pose_timeline = video
        .iter()
        .map(|frame| GazeHeadPosePoint {
            timestamp: round_to(frame.timestamp, 3),
            head_yaw: frame.head_pose.yaw,
            head_pitch: frame.head_pose.pitch,
            head_roll: frame.head_pose.roll,
            eye_contact: round_to(frame.eye_contact * 100.0, 2),
            gaze_direction: frame.gaze_direction,
        })
        .collect();

    TimelineArrays {
        emotion_timeline: trajectory.to_vec(),
        engagement_timeline,
        speech_timeline,
        gaze_head_pose_timeline,
    }
}

fn feedback_summary(
    scores: &FusionSummaryScores,
    speech: &SpeechQualityMetrics,
    engagement: &EngagementMetrics,
) -> FeedbackSummary {
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    let checks = [
        (
            scores.engagement_score,
            "Strong engagement maintained across most of the interview.",
            "Increase on-camera engagement and maintain steadier eye contact.",
        ),
        (
            scores.confidence_score,
            "Confident delivery with good visual presence.",
            "Boost confidence by reducing hesitation and improving posture consistency.",
        ),
        (
            scores.speech_fluency,
            "Speech fluency is consistent with a professional pace.",
            "Work on pacing and reducing long pauses between key points.",
        ),
        (
            scores.emotional_stability,
            "Emotional stability appears steady and composed.",
            "Aim for steadier emotional tone during challenging answers.",
        ),
    ];
    for (score, strength, improvement) in checks {
        if score >= STRENGTH_THRESHOLD {
            strengths.push(strength.to_string());
        } else {
            improvements.push(improvement.to_string());
        }
    }

    if speech.average_pause_duration > 0.8 {
        improvements.push("Shorten pauses by practicing concise response structures.".to_string());
    }
    if engagement.eye_contact_ratio > 0.75 {
        strengths.push("Excellent eye contact contributes to credibility.".to_string());
    }

    let strengths = cap_or_fallback(
        strengths,
        "Consistent participation across recorded segments.",
    );
    let improvements = cap_or_fallback(
        improvements,
        "Continue refining storytelling depth for stronger impact.",
    );

    let suggested_feedback_text = format!(
        "Top strengths: {} Primary improvements: {}",
        strengths.join(" "),
        improvements.join(" ")
    );

    FeedbackSummary {
        strengths,
        improvements,
        suggested_feedback_text,
    }
}

/// Keep at most three entries; an empty list becomes the single fallback
pub(crate) fn cap_or_fallback(mut items: Vec<String>, fallback: &str) -> Vec<String> {
    items.truncate(MAX_FEEDBACK_ITEMS);
    if items.is_empty() {
        items.push(fallback.to_string());
    }
    items
}

/// 0-1 ratio to a 2-decimal percentage
fn to_percent(ratio: f64) -> f64 {
    round_to(ratio * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::WindowAligner;
    use crate::types::{AudioSegmentFeature, GazeDirection, HeadPose, TextSegmentFeature};
    use pretty_assertions::assert_eq;

    fn centered_frame(timestamp: f64) -> VideoFrameFeature {
        VideoFrameFeature {
            timestamp,
            facial_emotion_scores: EmotionScores::from([
                ("happy".to_string(), 0.6),
                ("neutral".to_string(), 0.4),
            ]),
            head_pose: HeadPose::default(),
            gaze_direction: GazeDirection::Center,
            eye_contact: 1.0,
        }
    }

    #[test]
    fn test_single_centered_frame() {
        let video = vec![centered_frame(1.0)];
        let windows = WindowAligner::new(2.0, false).align(&video, &[], &[]);
        let metrics = SessionMetricsAggregator::aggregate(&video, &windows);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].gaze_direction, GazeDirection::Center);
        assert_eq!(metrics.engagement_metrics.eye_contact_ratio, 1.0);
        assert_eq!(metrics.engagement_metrics.avg_head_stability, 1.0);
        assert!((metrics.engagement_metrics.overall_engagement - 0.8).abs() < 1e-12);
        assert_eq!(metrics.emotion_trajectory[0].dominant_emotion, "happy");
    }

    #[test]
    fn test_empty_session_defaults() {
        let windows = WindowAligner::new(2.0, false).align(&[], &[], &[]);
        let metrics = SessionMetricsAggregator::aggregate(&[], &windows);

        assert_eq!(
            metrics.emotion_trajectory,
            vec![EmotionPoint {
                timestamp: 0.0,
                dominant_emotion: "neutral".to_string(),
                emotion_scores: EmotionScores::from([("neutral".to_string(), 1.0)]),
            }]
        );
        assert_eq!(metrics.engagement_metrics, EngagementMetrics::default());
        assert_eq!(metrics.speech_quality_metrics, SpeechQualityMetrics::default());
        assert_eq!(metrics.segment_labels.len(), 1);
        assert_eq!(metrics.segment_labels[0].segment_id, "segment_1");
        assert_eq!(metrics.segment_labels[0].label, "Question Segment 1");
        assert!(metrics.timeline_arrays.gaze_head_pose_timeline.is_empty());
        assert_eq!(metrics.summary_scores.emotional_stability, 100.0);
    }

    #[test]
    fn test_no_windows_stability_defaults_to_half() {
        let metrics = SessionMetricsAggregator::aggregate(&[], &[]);
        assert_eq!(metrics.summary_scores.emotional_stability, 50.0);
        assert!(metrics.segment_labels.is_empty());
    }

    #[test]
    fn test_dominant_emotion_ties_and_empty() {
        let tied = EmotionScores::from([
            ("sad".to_string(), 0.5),
            ("happy".to_string(), 0.5),
        ]);
        assert_eq!(dominant_emotion(&tied), "happy");
        assert_eq!(dominant_emotion(&EmotionScores::new()), "neutral");
    }

    #[test]
    fn test_speech_metrics_are_window_means() {
        let audio = vec![
            AudioSegmentFeature {
                start: 0.0,
                end: 2.0,
                pitch: 120.0,
                pause_duration: 0.2,
                speaking_rate: 100.0,
                ..Default::default()
            },
            AudioSegmentFeature {
                start: 2.0,
                end: 4.0,
                pitch: 180.0,
                pause_duration: 0.6,
                speaking_rate: 160.0,
                ..Default::default()
            },
        ];
        let windows = WindowAligner::new(2.0, false).align(&[], &audio, &[]);
        // windows [0,2), [2,4), [4,6) with the last one empty
        assert_eq!(windows.len(), 3);

        let metrics = SessionMetricsAggregator::aggregate(&[], &windows);
        assert!((metrics.speech_quality_metrics.average_pitch - 100.0).abs() < 1e-9);
        assert!((metrics.speech_quality_metrics.speaking_rate_wpm - 260.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.timeline_arrays.speech_timeline[0].timestamp, 1.0);
        assert_eq!(metrics.timeline_arrays.speech_timeline[1].pitch, 180.0);
    }

    #[test]
    fn test_segment_label_scores() {
        let text = vec![TextSegmentFeature {
            start: 0.0,
            end: 1.0,
            semantic_relevance: 0.8,
            sentiment_score: 1.0,
            answer_coherence: 0.5,
        }];
        let video = vec![centered_frame(0.5)];
        let windows = WindowAligner::new(2.0, false).align(&video, &[], &text);
        let metrics = SessionMetricsAggregator::aggregate(&video, &windows);

        let label = &metrics.segment_labels[0];
        // 0.4*0.6 + 0.3*0.4 + 0.3*1.0 = 0.66
        assert_eq!(label.engagement_score, 66.0);
        assert_eq!(label.text_relevance_score, 80.0);
        // rate 0 => rate quality 0, no pauses => pause quality 1
        assert_eq!(label.speech_fluency, 20.0);
        assert_eq!(label.dominant_emotion, "happy");
    }

    #[test]
    fn test_feedback_summary_caps_and_fallbacks() {
        let video: Vec<VideoFrameFeature> = (0..4).map(|i| centered_frame(i as f64 * 0.5)).collect();
        let windows = WindowAligner::new(2.0, false).align(&video, &[], &[]);
        let metrics = SessionMetricsAggregator::aggregate(&video, &windows);
        let feedback = &metrics.feedback_summary;

        assert!(feedback.strengths.len() <= 3);
        assert!(feedback.improvements.len() <= 3);
        assert!(!feedback.strengths.is_empty());
        assert!(feedback
            .strengths
            .contains(&"Strong engagement maintained across most of the interview.".to_string()));
        assert!(feedback.suggested_feedback_text.starts_with("Top strengths: "));
        assert!(feedback.suggested_feedback_text.contains(" Primary improvements: "));
    }

    #[test]
    fn test_cap_or_fallback() {
        assert_eq!(cap_or_fallback(vec![], "fallback"), vec!["fallback".to_string()]);
        let items: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(cap_or_fallback(items, "fallback").len(), 3);
    }
}
