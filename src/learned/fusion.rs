//! Seeded two-layer fusion map applied to per-window fused vectors

use super::dense::{relu, Linear};
use crate::types::{FusedVector, FUSED_VECTOR_LEN};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// `Linear(10,10) → ReLU → Linear(10,10)` with weights drawn once from `seed`
#[derive(Debug, Clone)]
pub struct FusionMlp {
    first: Linear,
    second: Linear,
}

impl FusionMlp {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let first = Linear::seeded(FUSED_VECTOR_LEN, FUSED_VECTOR_LEN, &mut rng);
        let second = Linear::seeded(FUSED_VECTOR_LEN, FUSED_VECTOR_LEN, &mut rng);
        Self { first, second }
    }

    pub fn forward(&self, raw: &FusedVector) -> FusedVector {
        let mut hidden = self.first.forward(raw);
        relu(&mut hidden);
        let output = self.second.forward(&hidden);

        let mut fused = [0.0; FUSED_VECTOR_LEN];
        for (slot, value) in fused.iter_mut().zip(output) {
            *slot = value;
        }
        fused
    }
}
