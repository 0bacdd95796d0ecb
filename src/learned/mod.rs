//! Seeded learned transforms (feature `learned`)
//!
//! Both models are built once from a fixed seed and are deterministic for the
//! lifetime of the value that owns them.

pub mod attention;
pub mod dense;
pub mod fusion;

pub use attention::AttentionRegressor;
pub use fusion::FusionMlp;
