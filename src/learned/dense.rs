//! Dense layer primitives for the seeded learned transforms

use rand::rngs::StdRng;
use rand::Rng;

/// Fully connected layer, weights stored row-major as `out_dim × in_dim`
#[derive(Debug, Clone)]
pub struct Linear {
    in_dim: usize,
    out_dim: usize,
    weight: Vec<f64>,
    bias: Vec<f64>,
}

impl Linear {
    /// Uniform `±1/sqrt(in_dim)` for weights and bias
    pub fn seeded(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (in_dim as f64).sqrt();
        let weight = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        let bias = (0..out_dim).map(|_| rng.gen_range(-bound..bound)).collect();
        Self {
            in_dim,
            out_dim,
            weight,
            bias,
        }
    }

    /// Glorot-uniform weights, zero bias (attention projections)
    pub fn xavier(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Self {
        let bound = (6.0 / (in_dim + out_dim) as f64).sqrt();
        let weight = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        Self {
            in_dim,
            out_dim,
            weight,
            bias: vec![0.0; out_dim],
        }
    }

    /// Uniform `±1/sqrt(in_dim)` weights, zero bias
    pub fn seeded_no_bias(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Self {
        let mut layer = Self::seeded(in_dim, out_dim, rng);
        layer.bias.iter_mut().for_each(|b| *b = 0.0);
        layer
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Inputs shorter than `in_dim` are treated as zero-padded
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let width = input.len().min(self.in_dim);
        (0..self.out_dim)
            .map(|row| {
                let offset = row * self.in_dim;
                let dot: f64 = self.weight[offset..offset + width]
                    .iter()
                    .zip(&input[..width])
                    .map(|(w, x)| w * x)
                    .sum();
                dot + self.bias[row]
            })
            .collect()
    }
}

pub fn relu(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = v.max(0.0);
    }
}

/// GELU, tanh approximation
pub fn gelu(values: &mut [f64]) {
    const C: f64 = 0.797_884_560_802_865_4; // sqrt(2/pi)
    for v in values.iter_mut() {
        let x = *v;
        *v = 0.5 * x * (1.0 + (C * (x + 0.044_715 * x * x * x)).tanh());
    }
}

/// Unit-gain, zero-shift layer normalisation
pub fn layer_norm(values: &mut [f64], eps: f64) {
    if values.is_empty() {
        return;
    }
    let n = values.len() as f64;
    let mu = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / n;
    let denom = (var + eps).sqrt();
    for v in values.iter_mut() {
        *v = (*v - mu) / denom;
    }
}

pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![0.0; values.len()];
    }
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_seeded_layers_are_reproducible() {
        let a = Linear::seeded(4, 3, &mut StdRng::seed_from_u64(7));
        let b = Linear::seeded(4, 3, &mut StdRng::seed_from_u64(7));
        let input = [0.1, -0.4, 0.9, 0.3];
        assert_eq!(a.forward(&input), b.forward(&input));
        assert_eq!(a.out_dim(), 3);
    }

    #[test]
    fn test_weights_within_init_bound() {
        let layer = Linear::seeded(16, 4, &mut StdRng::seed_from_u64(7));
        assert!(layer.weight.iter().all(|w| w.abs() <= 0.25));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_layer_norm_zero_mean() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        layer_norm(&mut values, 1e-5);
        assert!(values.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn test_activations() {
        let mut values = vec![-1.0, 0.0, 2.0];
        relu(&mut values);
        assert_eq!(values, vec![0.0, 0.0, 2.0]);

        let mut values = vec![0.0, 3.0];
        gelu(&mut values);
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 3.0).abs() < 0.01);
    }
}
