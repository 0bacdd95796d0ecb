//! Pipeline configuration
//!
//! Configuration is plain serde data with defaults for every field, loaded from
//! JSON and optionally overridden from the environment.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest window the aligner will use (seconds)
pub const MIN_WINDOW_SIZE_SECONDS: f64 = 0.5;

/// Default window size (seconds)
pub const DEFAULT_WINDOW_SIZE_SECONDS: f64 = 2.0;

/// Seed shared by the learned fusion map and the attention encoder
pub const DEFAULT_MODEL_SEED: u64 = 7;

/// Default neutral-feature audit history cap
pub const DEFAULT_NEUTRAL_HISTORY_CAPACITY: usize = 1000;

/// Default sensitive-attribute audit history cap
pub const DEFAULT_SENSITIVE_HISTORY_CAPACITY: usize = 500;

/// Set to `1` to force both learned paths off
pub const ENV_DISABLE_MODELS: &str = "FUSION_DISABLE_MODELS";

/// Overrides `window_size_seconds`
pub const ENV_WINDOW_SIZE: &str = "FUSION_WINDOW_SIZE_SECONDS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FusionConfig {
    /// Requested window size; values under 0.5 s are clamped, never rejected
    pub window_size_seconds: f64,
    /// Pass fused vectors through the seeded learned map when available
    pub use_learned_fusion: bool,
    /// Use the attention encoder backend when available
    pub use_attention_encoder: bool,
    pub seed: u64,
    pub neutral_history_capacity: usize,
    pub sensitive_history_capacity: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: DEFAULT_WINDOW_SIZE_SECONDS,
            use_learned_fusion: false,
            use_attention_encoder: true,
            seed: DEFAULT_MODEL_SEED,
            neutral_history_capacity: DEFAULT_NEUTRAL_HISTORY_CAPACITY,
            sensitive_history_capacity: DEFAULT_SENSITIVE_HISTORY_CAPACITY,
        }
    }
}

impl FusionConfig {
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        serde_json::from_str(json).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ComputeError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Apply `FUSION_DISABLE_MODELS` and `FUSION_WINDOW_SIZE_SECONDS`
    pub fn with_env_overrides(self) -> Result<Self, ComputeError> {
        self.with_overrides(
            std::env::var(ENV_DISABLE_MODELS).ok().as_deref(),
            std::env::var(ENV_WINDOW_SIZE).ok().as_deref(),
        )
    }

    fn with_overrides(
        mut self,
        disable_models: Option<&str>,
        window_size: Option<&str>,
    ) -> Result<Self, ComputeError> {
        if matches!(disable_models.map(str::trim), Some("1") | Some("true")) {
            self.use_learned_fusion = false;
            self.use_attention_encoder = false;
        }
        if let Some(raw) = window_size.map(str::trim).filter(|v| !v.is_empty()) {
            self.window_size_seconds = raw.parse::<f64>().map_err(|e| {
                ComputeError::ConfigError(format!("{ENV_WINDOW_SIZE}={raw}: {e}"))
            })?;
        }
        Ok(self)
    }

    /// Window size after applying the 0.5 s floor
    pub fn effective_window_size(&self) -> f64 {
        effective_window_size(self.window_size_seconds)
    }
}

/// Clamp a requested window size to the 0.5 s floor. NaN falls back to the floor.
pub fn effective_window_size(requested: f64) -> f64 {
    if requested.is_nan() {
        return MIN_WINDOW_SIZE_SECONDS;
    }
    requested.max(MIN_WINDOW_SIZE_SECONDS)
}
