//! Window alignment
//!
//! Buckets the three asynchronous feature streams into fixed-size, half-open
//! time windows `[k·w, (k+1)·w)` spanning `[0, max_timestamp]` and aggregates
//! each stream per window:
//! - video frames by point membership
//! - audio/text segments by strict interval overlap

use crate::config::{effective_window_size, FusionConfig, DEFAULT_MODEL_SEED};
use crate::stats::{mean, round_to};
use crate::types::{
    AudioSegmentFeature, EmotionScores, FusedVector, FusedWindow, GazeDirection, HeadPose,
    SpeechFeatures, TextScores, TextSegmentFeature, VideoFrameFeature,
};
use tracing::debug;

#[cfg(feature = "learned")]
use crate::learned::FusionMlp;

/// Decimal places kept in every fused vector component
const FUSED_VECTOR_DECIMALS: i32 = 6;

/// Gaze directions in tie-break order
const GAZE_PRIORITY: [GazeDirection; 4] = [
    GazeDirection::Center,
    GazeDirection::Left,
    GazeDirection::Right,
    GazeDirection::Unknown,
];

/// Aligner for fusing per-modality streams into time windows
#[derive(Debug, Clone)]
pub struct WindowAligner {
    window_size: f64,
    #[cfg(feature = "learned")]
    fusion: Option<FusionMlp>,
}

impl Default for WindowAligner {
    fn default() -> Self {
        Self::from_config(&FusionConfig::default())
    }
}

impl WindowAligner {
    /// Create an aligner; window sizes below 0.5 s are clamped
    pub fn new(window_size_seconds: f64, use_learned_fusion: bool) -> Self {
        Self::with_seed(window_size_seconds, use_learned_fusion, DEFAULT_MODEL_SEED)
    }

    /// Create an aligner whose learned fusion map is drawn from `seed`
    #[cfg_attr(not(feature = "learned"), allow(unused_variables))]
    pub fn with_seed(window_size_seconds: f64, use_learned_fusion: bool, seed: u64) -> Self {
        Self {
            window_size: effective_window_size(window_size_seconds),
            #[cfg(feature = "learned")]
            fusion: use_learned_fusion.then(|| FusionMlp::new(seed)),
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::with_seed(
            config.window_size_seconds,
            config.use_learned_fusion,
            config.seed,
        )
    }

    /// Effective window size in seconds
    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Whether fused vectors pass through the learned map
    pub fn learned_fusion_active(&self) -> bool {
        #[cfg(feature = "learned")]
        {
            self.fusion.is_some()
        }
        #[cfg(not(feature = "learned"))]
        {
            false
        }
    }

    /// Align the three streams into an ordered, gap-free window sequence.
    ///
    /// Always yields at least one window. The final window may extend past the
    /// last observed timestamp; windows are never truncated.
    pub fn align(
        &self,
        video: &[VideoFrameFeature],
        audio: &[AudioSegmentFeature],
        text: &[TextSegmentFeature],
    ) -> Vec<FusedWindow> {
        let max_time = max_timestamp(video, audio, text);
        let mut windows = Vec::new();

        let mut index: u64 = 0;
        loop {
            let start = index as f64 * self.window_size;
            if start > max_time {
                break;
            }
            let end = (index + 1) as f64 * self.window_size;

            let video_slice: Vec<&VideoFrameFeature> = video
                .iter()
                .filter(|frame| start <= frame.timestamp && frame.timestamp < end)
                .collect();
            let audio_slice: Vec<&AudioSegmentFeature> = audio
                .iter()
                .filter(|seg| overlaps(start, end, seg.start, seg.end))
                .collect();
            let text_slice: Vec<&TextSegmentFeature> = text
                .iter()
                .filter(|seg| overlaps(start, end, seg.start, seg.end))
                .collect();

            let facial_emotion_scores = mean_emotions(&video_slice);
            let head_pose = mean_head_pose(&video_slice);
            let gaze_direction = dominant_gaze(&video_slice);
            let speech_features = mean_speech(&audio_slice);
            let text_scores = mean_text_scores(&text_slice);

            let raw = raw_fused_vector(
                &facial_emotion_scores,
                &speech_features,
                &text_scores,
                gaze_direction,
            );

            windows.push(FusedWindow {
                start_time: start,
                end_time: end,
                facial_emotion_scores,
                head_pose,
                gaze_direction,
                speech_features,
                text_scores,
                fused_vector: self.apply_fusion(raw),
            });
            index += 1;
        }

        debug!(
            windows = windows.len(),
            window_size = self.window_size,
            max_time,
            learned_fusion = self.learned_fusion_active(),
            "aligned feature streams"
        );

        windows
    }

    fn apply_fusion(&self, raw: FusedVector) -> FusedVector {
        #[cfg(feature = "learned")]
        let raw = match &self.fusion {
            Some(mlp) => mlp.forward(&raw),
            None => raw,
        };
        raw.map(|value| round_to(value, FUSED_VECTOR_DECIMALS))
    }
}

/// Latest time covered by any stream (0 if all are empty)
pub fn max_timestamp(
    video: &[VideoFrameFeature],
    audio: &[AudioSegmentFeature],
    text: &[TextSegmentFeature],
) -> f64 {
    video
        .iter()
        .map(|frame| frame.timestamp)
        .chain(audio.iter().map(|seg| seg.end))
        .chain(text.iter().map(|seg| seg.end))
        .fold(0.0, f64::max)
}

/// Strict overlap of `[start_a, end_a)` and `[start_b, end_b)`
fn overlaps(start_a: f64, end_a: f64, start_b: f64, end_b: f64) -> bool {
    start_a.max(start_b) < end_a.min(end_b)
}

fn mean_emotions(frames: &[&VideoFrameFeature]) -> EmotionScores {
    if frames.is_empty() {
        return EmotionScores::from([("neutral".to_string(), 1.0)]);
    }
    let mut totals = EmotionScores::new();
    for frame in frames {
        for (label, score) in &frame.facial_emotion_scores {
            *totals.entry(label.clone()).or_insert(0.0) += score;
        }
    }
    let count = frames.len() as f64;
    totals.values_mut().for_each(|v| *v /= count);
    totals
}

fn mean_head_pose(frames: &[&VideoFrameFeature]) -> HeadPose {
    if frames.is_empty() {
        return HeadPose::default();
    }
    HeadPose {
        yaw: mean(frames.iter().map(|f| f.head_pose.yaw)),
        pitch: mean(frames.iter().map(|f| f.head_pose.pitch)),
        roll: mean(frames.iter().map(|f| f.head_pose.roll)),
    }
}

/// Most frequent gaze; ties resolved `center > left > right > unknown`
fn dominant_gaze(frames: &[&VideoFrameFeature]) -> GazeDirection {
    if frames.is_empty() {
        return GazeDirection::Unknown;
    }
    let mut counts = [0usize; GAZE_PRIORITY.len()];
    for frame in frames {
        counts[frame.gaze_direction.tie_break_rank() as usize] += 1;
    }
    let mut best = 0;
    for rank in 1..counts.len() {
        if counts[rank] > counts[best] {
            best = rank;
        }
    }
    GAZE_PRIORITY[best]
}

fn mean_speech(segments: &[&AudioSegmentFeature]) -> SpeechFeatures {
    if segments.is_empty() {
        return SpeechFeatures::default();
    }
    SpeechFeatures {
        pitch: mean(segments.iter().map(|s| s.pitch)),
        pause_duration: mean(segments.iter().map(|s| s.pause_duration)),
        speaking_rate: mean(segments.iter().map(|s| s.speaking_rate)),
        prosody_score: mean(segments.iter().map(|s| s.prosody.log_mel_std)),
    }
}

fn mean_text_scores(segments: &[&TextSegmentFeature]) -> TextScores {
    if segments.is_empty() {
        return TextScores::default();
    }
    TextScores {
        semantic_relevance: mean(segments.iter().map(|s| s.semantic_relevance)),
        sentiment_score: mean(segments.iter().map(|s| s.sentiment_score)),
        answer_coherence: mean(segments.iter().map(|s| s.answer_coherence)),
    }
}

/// `[happy, neutral, sad, rate, pitch, pause, relevance, sentiment, coherence, center]`
pub fn raw_fused_vector(
    emotions: &EmotionScores,
    speech: &SpeechFeatures,
    text: &TextScores,
    gaze: GazeDirection,
) -> FusedVector {
    let emotion = |label: &str| emotions.get(label).copied().unwrap_or(0.0);
    [
        emotion("happy"),
        emotion("neutral"),
        emotion("sad"),
        speech.speaking_rate,
        speech.pitch,
        speech.pause_duration,
        text.semantic_relevance,
        text.sentiment_score,
        text.answer_coherence,
        if gaze.is_center() { 1.0 } else { 0.0 },
    ]
}
