//! Small numeric helpers shared by the aggregator, scorers and auditors

/// Arithmetic mean; 0.0 for an empty iterator
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean_opt(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance; 0.0 for fewer than two values
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values.iter().copied());
    values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64
}

pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Clamp that maps NaN to `low`
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        return low;
    }
    value.max(low).min(high)
}

/// Accept either a 0-1 ratio or a 0-100 percentage and return a percentage
pub fn normalize_percent(value: f64) -> f64 {
    if value <= 1.0 {
        clamp(value * 100.0, 0.0, 100.0)
    } else {
        clamp(value, 0.0, 100.0)
    }
}

/// Numerically stable logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Squash a raw logit onto the 0-100 score scale
pub fn sigmoid_to_100(x: f64) -> f64 {
    clamp(sigmoid(x) * 100.0, 0.0, 100.0)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Map a -1..1 sentiment onto 0..1
pub fn sentiment_norm(sentiment: f64) -> f64 {
    clamp01((sentiment + 1.0) / 2.0)
}

/// 1.0 at the ideal 135 wpm pace, falling linearly to 0 at 0 or 270 wpm
pub fn rate_quality(speaking_rate: f64) -> f64 {
    clamp01(1.0 - ((speaking_rate - 135.0).abs() / 135.0).min(1.0))
}

/// 1.0 with no pauses, 0 once the average pause reaches 1.5 s
pub fn pause_quality(pause_duration: f64) -> f64 {
    clamp01(1.0 - (pause_duration / 1.5).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert!((mean(vec![1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
        assert_eq!(population_variance(&[5.0]), 0.0);
        // pvariance([1, 3]) = 1
        assert!((population_variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_handles_nan() {
        assert_eq!(clamp(f64::NAN, 0.0, 100.0), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(0.75), 75.0);
        assert_eq!(normalize_percent(82.0), 82.0);
        assert_eq!(normalize_percent(140.0), 100.0);
    }

    #[test]
    fn test_sigmoid_to_100_bounds() {
        assert!((sigmoid_to_100(0.0) - 50.0).abs() < 1e-12);
        assert!(sigmoid_to_100(1e6) <= 100.0);
        assert!(sigmoid_to_100(-1e6) >= 0.0);
    }

    #[test]
    fn test_rate_and_pause_quality() {
        assert_eq!(rate_quality(135.0), 1.0);
        assert_eq!(rate_quality(0.0), 0.0);
        assert_eq!(rate_quality(400.0), 0.0);
        assert_eq!(pause_quality(0.0), 1.0);
        assert!((pause_quality(0.75) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.1234567, 6), 0.123457);
        assert_eq!(round_to(2.34567, 2), 2.35);
    }
}
