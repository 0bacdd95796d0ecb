//! Single-layer transformer encoder over the three modality embeddings
//!
//! The three 4-dim embeddings (vision, audio, text) are treated as a 3-token
//! sequence. One post-norm encoder layer (2 heads, feed-forward width 16, GELU)
//! is applied, tokens are mean-pooled, and a small feed-forward head emits four
//! logits, one per advanced score key.

use super::dense::{gelu, layer_norm, softmax, Linear};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const EMBEDDING_DIM: usize = 4;
pub const NUM_HEADS: usize = 2;
pub const HIDDEN_DIM: usize = 16;
pub const NUM_OUTPUTS: usize = 4;

const HEAD_DIM: usize = EMBEDDING_DIM / NUM_HEADS;
const LAYER_NORM_EPS: f64 = 1e-5;

pub type Token = [f64; EMBEDDING_DIM];

#[derive(Debug, Clone)]
pub struct AttentionRegressor {
    in_proj: Linear,
    out_proj: Linear,
    ff_in: Linear,
    ff_out: Linear,
    head_in: Linear,
    head_out: Linear,
}

impl AttentionRegressor {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            in_proj: Linear::xavier(EMBEDDING_DIM, 3 * EMBEDDING_DIM, &mut rng),
            out_proj: Linear::seeded_no_bias(EMBEDDING_DIM, EMBEDDING_DIM, &mut rng),
            ff_in: Linear::seeded(EMBEDDING_DIM, HIDDEN_DIM, &mut rng),
            ff_out: Linear::seeded(HIDDEN_DIM, EMBEDDING_DIM, &mut rng),
            head_in: Linear::seeded(EMBEDDING_DIM, HIDDEN_DIM, &mut rng),
            head_out: Linear::seeded(HIDDEN_DIM, NUM_OUTPUTS, &mut rng),
        }
    }

    /// Raw logits for `[engagement, communicationClarity, interviewComprehension, overallPerformance]`
    pub fn forward(&self, tokens: &[Token]) -> [f64; NUM_OUTPUTS] {
        if tokens.is_empty() {
            return [0.0; NUM_OUTPUTS];
        }

        let attended = self.self_attention(tokens);

        // Post-norm residual blocks
        let encoded: Vec<Vec<f64>> = tokens
            .iter()
            .zip(attended)
            .map(|(token, attn)| {
                let mut x: Vec<f64> = token.iter().zip(&attn).map(|(a, b)| a + b).collect();
                layer_norm(&mut x, LAYER_NORM_EPS);

                let mut hidden = self.ff_in.forward(&x);
                gelu(&mut hidden);
                let ff = self.ff_out.forward(&hidden);

                let mut y: Vec<f64> = x.iter().zip(&ff).map(|(a, b)| a + b).collect();
                layer_norm(&mut y, LAYER_NORM_EPS);
                y
            })
            .collect();

        let mut pooled = vec![0.0; EMBEDDING_DIM];
        for token in &encoded {
            for (slot, value) in pooled.iter_mut().zip(token) {
                *slot += value;
            }
        }
        let count = encoded.len() as f64;
        pooled.iter_mut().for_each(|v| *v /= count);

        let mut hidden = self.head_in.forward(&pooled);
        gelu(&mut hidden);
        let logits = self.head_out.forward(&hidden);

        let mut out = [0.0; NUM_OUTPUTS];
        for (slot, value) in out.iter_mut().zip(logits) {
            *slot = value;
        }
        out
    }

    fn self_attention(&self, tokens: &[Token]) -> Vec<Vec<f64>> {
        // Packed projection layout per token: [q | k | v], each EMBEDDING_DIM wide
        let projected: Vec<Vec<f64>> = tokens.iter().map(|t| self.in_proj.forward(t)).collect();
        let scale = 1.0 / (HEAD_DIM as f64).sqrt();

        (0..tokens.len())
            .map(|i| {
                let mut concat = vec![0.0; EMBEDDING_DIM];
                for h in 0..NUM_HEADS {
                    let query = head_slice(&projected[i], 0, h);
                    let scores: Vec<f64> = projected
                        .iter()
                        .map(|other| {
                            query
                                .iter()
                                .zip(head_slice(other, 1, h))
                                .map(|(q, k)| q * k)
                                .sum::<f64>()
                                * scale
                        })
                        .collect();
                    let weights = softmax(&scores);
                    for (other, w) in projected.iter().zip(&weights) {
                        for (d, v) in head_slice(other, 2, h).iter().enumerate() {
                            concat[h * HEAD_DIM + d] += w * v;
                        }
                    }
                }
                self.out_proj.forward(&concat)
            })
            .collect()
    }
}

/// `part` 0 = query, 1 = key, 2 = value
fn head_slice(packed: &[f64], part: usize, head: usize) -> &[f64] {
    let start = part * EMBEDDING_DIM + head * HEAD_DIM;
    &packed[start..start + HEAD_DIM]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<Token> {
        vec![
            [0.78, 0.82, 1.0, 0.86],
            [0.97, 0.77, 0.71, 0.99],
            [0.85, 0.85, 0.8, 0.59],
        ]
    }

    #[test]
    fn test_forward_is_deterministic() {
        let model = AttentionRegressor::new(7);
        assert_eq!(model.forward(&tokens()), model.forward(&tokens()));
        assert_eq!(
            AttentionRegressor::new(7).forward(&tokens()),
            AttentionRegressor::new(7).forward(&tokens())
        );
    }

    #[test]
    fn test_forward_is_finite() {
        let logits = AttentionRegressor::new(7).forward(&tokens());
        assert!(logits.iter().all(|v| v.is_finite()));

        let zeros = AttentionRegressor::new(7).forward(&[[0.0; EMBEDDING_DIM]; 3]);
        assert!(zeros.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(AttentionRegressor::new(7).forward(&[]), [0.0; NUM_OUTPUTS]);
    }
}
