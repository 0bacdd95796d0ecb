//! Error types for Interview Fusion
//!
//! The scoring core itself never fails; every aggregation degrades to a
//! documented default. These errors only surface at the JSON and configuration
//! boundaries.

use thiserror::Error;

/// Errors that can occur at the edges of the fusion pipeline
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse session features: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Audit history error: {0}")]
    HistoryError(String),
}
