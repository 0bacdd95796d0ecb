//! Modality encoders
//!
//! An encoder turns the three 4-value modality embeddings into one 0-100
//! prediction per advanced score key. The backend is chosen once when the
//! advanced scorer is built.

use crate::stats::clamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(feature = "learned")]
use crate::learned::AttentionRegressor;
#[cfg(feature = "learned")]
use crate::stats::sigmoid_to_100;

/// Width of each modality embedding
pub const EMBEDDING_LEN: usize = 4;

pub type Embedding = [f64; EMBEDDING_LEN];

/// Wire names of the advanced score keys, in output order
pub const SCORE_KEYS: [&str; 4] = [
    "engagement",
    "communicationClarity",
    "interviewComprehension",
    "overallPerformance",
];

/// Vision, audio and text embeddings for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityEmbeddings {
    pub vision: Embedding,
    pub audio: Embedding,
    pub text: Embedding,
}

impl ModalityEmbeddings {
    /// `[vision | audio | text]`
    pub fn concat(&self) -> [f64; 3 * EMBEDDING_LEN] {
        let mut out = [0.0; 3 * EMBEDDING_LEN];
        for (idx, value) in self
            .vision
            .iter()
            .chain(&self.audio)
            .chain(&self.text)
            .enumerate()
        {
            out[idx] = *value;
        }
        out
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            vision: self.vision.map(&f),
            audio: self.audio.map(&f),
            text: self.text.map(&f),
        }
    }
}

/// One value per advanced score key
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedScores {
    pub engagement: f64,
    pub communication_clarity: f64,
    pub interview_comprehension: f64,
    pub overall_performance: f64,
}

impl AdvancedScores {
    pub fn from_array(values: [f64; 4]) -> Self {
        let [engagement, communication_clarity, interview_comprehension, overall_performance] =
            values;
        Self {
            engagement,
            communication_clarity,
            interview_comprehension,
            overall_performance,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [
            self.engagement,
            self.communication_clarity,
            self.interview_comprehension,
            self.overall_performance,
        ]
    }

    /// `(wire key, value)` pairs in output order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        let values = self.to_array();
        [
            (SCORE_KEYS[0], values[0]),
            (SCORE_KEYS[1], values[1]),
            (SCORE_KEYS[2], values[2]),
            (SCORE_KEYS[3], values[3]),
        ]
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_array(self.to_array().map(f))
    }

    /// Apply `f(self, other)` key by key
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        Self::from_array([f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2]), f(a[3], b[3])])
    }
}

/// Strategy producing per-key encoder scores from the embeddings
pub trait ScoreEncoder: Send + Sync {
    fn backend(&self) -> EncoderBackendKind;

    fn encode(&self, embeddings: &ModalityEmbeddings) -> AdvancedScores;
}

pub type ScoreEncoderHandle = Arc<dyn ScoreEncoder>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncoderBackendKind {
    LinearFallback,
    Attention,
}

impl Default for EncoderBackendKind {
    fn default() -> Self {
        EncoderBackendKind::LinearFallback
    }
}

impl EncoderBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncoderBackendKind::LinearFallback => "linearFallback",
            EncoderBackendKind::Attention => "attention",
        }
    }

    /// Whether this build can run the backend
    pub fn is_available(&self) -> bool {
        match self {
            EncoderBackendKind::LinearFallback => true,
            EncoderBackendKind::Attention => cfg!(feature = "learned"),
        }
    }
}

/// Fixed blend of the leading embedding components
pub struct LinearFallbackBackend;

impl ScoreEncoder for LinearFallbackBackend {
    fn backend(&self) -> EncoderBackendKind {
        EncoderBackendKind::LinearFallback
    }

    fn encode(&self, embeddings: &ModalityEmbeddings) -> AdvancedScores {
        let v = &embeddings.vision;
        let a = &embeddings.audio;
        let t = &embeddings.text;
        AdvancedScores {
            engagement: clamp(v[0] * 65.0 + v[1] * 35.0, 0.0, 100.0),
            communication_clarity: clamp(a[0] * 50.0 + a[1] * 50.0, 0.0, 100.0),
            interview_comprehension: clamp(t[0] * 65.0 + t[1] * 35.0, 0.0, 100.0),
            overall_performance: clamp((v[0] + a[0] + t[0]) / 3.0 * 100.0, 0.0, 100.0),
        }
    }
}

/// Seeded transformer encoder over the embeddings as a 3-token sequence
#[cfg(feature = "learned")]
pub struct AttentionEncoderBackend {
    model: AttentionRegressor,
}

#[cfg(feature = "learned")]
impl AttentionEncoderBackend {
    pub fn new(seed: u64) -> Self {
        Self {
            model: AttentionRegressor::new(seed),
        }
    }
}

#[cfg(feature = "learned")]
impl ScoreEncoder for AttentionEncoderBackend {
    fn backend(&self) -> EncoderBackendKind {
        EncoderBackendKind::Attention
    }

    fn encode(&self, embeddings: &ModalityEmbeddings) -> AdvancedScores {
        let logits = self
            .model
            .forward(&[embeddings.vision, embeddings.audio, embeddings.text]);
        AdvancedScores::from_array(logits.map(sigmoid_to_100))
    }
}

/// Build the requested backend, falling back to the linear blend when the
/// attention encoder is not compiled in
pub fn create_score_encoder(kind: EncoderBackendKind, seed: u64) -> ScoreEncoderHandle {
    match kind {
        EncoderBackendKind::LinearFallback => Arc::new(LinearFallbackBackend),
        #[cfg(feature = "learned")]
        EncoderBackendKind::Attention => Arc::new(AttentionEncoderBackend::new(seed)),
        #[cfg(not(feature = "learned"))]
        EncoderBackendKind::Attention => {
            let _ = seed;
            tracing::debug!("attention encoder unavailable in this build, using linear fallback");
            Arc::new(LinearFallbackBackend)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddings() -> ModalityEmbeddings {
        ModalityEmbeddings {
            vision: [0.8, 0.6, 1.0, 0.9],
            audio: [0.9, 0.7, 0.5, 1.0],
            text: [0.7, 0.5, 0.6, 0.55],
        }
    }

    #[test]
    fn test_linear_fallback_formulas() {
        let scores = LinearFallbackBackend.encode(&embeddings());
        assert!((scores.engagement - (52.0 + 21.0)).abs() < 1e-9);
        assert!((scores.communication_clarity - 80.0).abs() < 1e-9);
        assert!((scores.interview_comprehension - (45.5 + 17.5)).abs() < 1e-9);
        assert!((scores.overall_performance - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_fallback_clamps() {
        let negative = ModalityEmbeddings {
            text: [0.0, -1.0, -1.0, 0.0],
            ..Default::default()
        };
        let scores = LinearFallbackBackend.encode(&negative);
        assert_eq!(scores.interview_comprehension, 0.0);
    }

    #[test]
    fn test_concat_order() {
        let flat = embeddings().concat();
        assert_eq!(flat[0], 0.8);
        assert_eq!(flat[4], 0.9);
        assert_eq!(flat[11], 0.55);
    }

    #[test]
    fn test_entries_use_wire_keys() {
        let scores = AdvancedScores::from_array([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(scores.entries()[1], ("communicationClarity", 2.0));
        let value = serde_json::to_value(scores).unwrap();
        assert_eq!(value["interviewComprehension"], 3.0);
    }

    #[cfg(feature = "learned")]
    #[test]
    fn test_attention_backend_is_bounded_and_seeded() {
        let encoder = create_score_encoder(EncoderBackendKind::Attention, 7);
        assert_eq!(encoder.backend(), EncoderBackendKind::Attention);

        let first = encoder.encode(&embeddings());
        let second = create_score_encoder(EncoderBackendKind::Attention, 7).encode(&embeddings());
        assert_eq!(first, second);
        for value in first.to_array() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[cfg(not(feature = "learned"))]
    #[test]
    fn test_attention_request_falls_back() {
        let encoder = create_score_encoder(EncoderBackendKind::Attention, 7);
        assert_eq!(encoder.backend(), EncoderBackendKind::LinearFallback);
    }
}
