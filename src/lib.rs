//! Interview Fusion - Multimodal fusion and scoring engine for recorded interviews
//!
//! Interview Fusion turns per-modality feature streams (video frames, audio
//! segments, transcript segments) into session scores through a deterministic
//! pipeline: window alignment → session metrics → rule-based and advanced
//! scoring → rubric mapping and feedback, with fairness auditors observing the
//! results.
//!
//! ## Modules
//!
//! - **Alignment**: [`aligner::WindowAligner`] buckets the three streams into fused windows
//! - **Scoring**: [`scoring::RuleBasedScorer`] and [`advanced::AdvancedScorer`]
//! - **Auditing**: [`audit`] holds the neutral-band and sensitive-attribute auditors
//! - **Service**: [`pipeline::ScoringService`] runs everything and keeps audit history

pub mod adapter;
pub mod advanced;
pub mod aligner;
pub mod audit;
pub mod config;
pub mod encoder;
pub mod error;
pub mod feedback;
#[cfg(feature = "learned")]
pub mod learned;
pub mod metrics;
pub mod pipeline;
pub mod regression;
pub mod rubric;
pub mod scoring;
pub mod stats;
pub mod types;

pub use adapter::{parse_session, SessionInput};
pub use advanced::{AdvancedScoreSet, AdvancedScorer};
pub use aligner::WindowAligner;
pub use audit::{BiasAuditor, NeutralFeatureAuditor};
pub use config::FusionConfig;
pub use encoder::{create_score_encoder, AdvancedScores, EncoderBackendKind, ScoreEncoder};
pub use error::ComputeError;
pub use feedback::generate_feedback;
pub use metrics::SessionMetricsAggregator;
pub use pipeline::{analyze_session, ScoringService, SessionReport};
pub use rubric::{map_scores_to_rubric, score_to_level, RubricLevel};
pub use scoring::RuleBasedScorer;

/// Crate version embedded in every session report
pub const FUSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session reports
pub const PRODUCER_NAME: &str = "interview-fusion";
