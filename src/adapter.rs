//! Session input adapter
//!
//! Parses session feature JSON into typed records and sanitizes every field in
//! one place, so downstream stages never re-check for missing or malformed
//! values.

use crate::error::ComputeError;
use crate::types::{
    AudioSegmentFeature, EmotionScores, TextSegmentFeature, VideoFrameFeature,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the upstream model runners produced for one recorded session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionInput {
    pub session_id: String,
    pub video: Vec<VideoFrameFeature>,
    pub audio: Vec<AudioSegmentFeature>,
    pub text: Vec<TextSegmentFeature>,
    /// Caller-supplied context, inspected only by the bias auditor
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Parse a session JSON string and sanitize it
pub fn parse_session(json: &str) -> Result<SessionInput, ComputeError> {
    let session: SessionInput = serde_json::from_str(json)
        .map_err(|e| ComputeError::ParseError(format!("Failed to parse session: {}", e)))?;
    Ok(sanitize(session))
}

/// Parse newline-delimited session JSON, skipping blank lines
pub fn parse_sessions_ndjson(input: &str) -> Result<Vec<SessionInput>, ComputeError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse_session(line.trim()).map_err(|e| match e {
                ComputeError::ParseError(msg) => {
                    ComputeError::ParseError(format!("line {}: {}", idx + 1, msg))
                }
                other => other,
            })
        })
        .collect()
}

/// Parse a JSON array of sessions
pub fn parse_sessions_array(input: &str) -> Result<Vec<SessionInput>, ComputeError> {
    let sessions: Vec<SessionInput> = serde_json::from_str(input)
        .map_err(|e| ComputeError::ParseError(format!("Failed to parse sessions: {}", e)))?;
    Ok(sessions.into_iter().map(sanitize).collect())
}

/// Clamp every feature into its documented domain
pub fn sanitize(mut session: SessionInput) -> SessionInput {
    for frame in &mut session.video {
        frame.timestamp = non_negative(frame.timestamp);
        frame.eye_contact = finite(frame.eye_contact).clamp(0.0, 1.0);
        frame.head_pose.yaw = finite(frame.head_pose.yaw);
        frame.head_pose.pitch = finite(frame.head_pose.pitch);
        frame.head_pose.roll = finite(frame.head_pose.roll);
        sanitize_emotions(&mut frame.facial_emotion_scores);
    }

    for segment in &mut session.audio {
        let (start, end) = sanitize_span(segment.start, segment.end);
        segment.start = start;
        segment.end = end;
        segment.pitch = non_negative(segment.pitch);
        segment.pause_duration = non_negative(segment.pause_duration);
        segment.speaking_rate = non_negative(segment.speaking_rate);
        segment.prosody.log_mel_std = finite(segment.prosody.log_mel_std);
        sanitize_emotions(&mut segment.speech_emotion_scores);
    }

    for segment in &mut session.text {
        let (start, end) = sanitize_span(segment.start, segment.end);
        segment.start = start;
        segment.end = end;
        segment.semantic_relevance = unit_interval(segment.semantic_relevance);
        segment.sentiment_score = unit_interval(segment.sentiment_score);
        segment.answer_coherence = unit_interval(segment.answer_coherence);
    }

    session
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    finite(value).max(0.0)
}

fn unit_interval(value: f64) -> f64 {
    finite(value).clamp(-1.0, 1.0)
}

/// Start clamps to 0; an end before the start collapses to an empty span
fn sanitize_span(start: f64, end: f64) -> (f64, f64) {
    let start = non_negative(start);
    let end = non_negative(end).max(start);
    (start, end)
}

fn sanitize_emotions(scores: &mut EmotionScores) {
    scores.retain(|_, v| v.is_finite());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GazeDirection;

    #[test]
    fn test_parse_full_session() {
        let json = r#"{
            "sessionId": "sess-1",
            "video": [{
                "timestamp": 0.5,
                "facialEmotionScores": {"happy": 0.6, "neutral": 0.4},
                "headPose": {"yaw": 2.0, "pitch": 1.0, "roll": 0.5},
                "gazeDirection": "center",
                "eyeContact": 1.0
            }],
            "audio": [{
                "start": 0.0, "end": 2.5, "pitch": 140.0, "pauseDuration": 0.3,
                "speakingRate": 128.0, "prosody": {"logMelStd": 0.7}
            }],
            "text": [{
                "start": 0.0, "end": 2.5, "semanticRelevance": 0.82,
                "sentimentScore": 0.2, "answerCoherence": 0.75
            }],
            "context": {"jobRole": "Engineer"}
        }"#;

        let session = parse_session(json).unwrap();
        assert_eq!(session.session_id, "sess-1");
        assert_eq!(session.video[0].gaze_direction, GazeDirection::Center);
        assert_eq!(session.audio[0].prosody.log_mel_std, 0.7);
        assert_eq!(session.text[0].semantic_relevance, 0.82);
        assert_eq!(session.context["jobRole"], "Engineer");
    }

    #[test]
    fn test_sanitize_clamps_out_of_domain_values() {
        let json = r#"{
            "video": [{"timestamp": -3.0, "eyeContact": 4.0}],
            "audio": [{"start": 5.0, "end": 2.0, "speakingRate": -10.0}],
            "text": [{"start": 0.0, "end": 1.0, "semanticRelevance": 1.8, "sentimentScore": -2.0}]
        }"#;

        let session = parse_session(json).unwrap();
        assert_eq!(session.video[0].timestamp, 0.0);
        assert_eq!(session.video[0].eye_contact, 1.0);
        assert_eq!(session.audio[0].start, 5.0);
        assert_eq!(session.audio[0].end, 5.0);
        assert_eq!(session.audio[0].speaking_rate, 0.0);
        assert_eq!(session.text[0].semantic_relevance, 1.0);
        assert_eq!(session.text[0].sentiment_score, -1.0);
    }

    #[test]
    fn test_empty_object_is_valid_session() {
        let session = parse_session("{}").unwrap();
        assert!(session.video.is_empty());
        assert!(session.audio.is_empty());
        assert!(session.text.is_empty());
    }

    #[test]
    fn test_ndjson_reports_line_number() {
        let input = "{\"sessionId\": \"a\"}\n\nnot json\n";
        let err = parse_sessions_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 3"));

        let sessions = parse_sessions_ndjson("{\"sessionId\": \"a\"}\n{\"sessionId\": \"b\"}\n").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].session_id, "b");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_session("not valid json"),
            Err(ComputeError::ParseError(_))
        ));
    }
}
