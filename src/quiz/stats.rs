//! Descriptive statistics over telemetry samples
//!
//! Every helper is total: empty input yields 0.0 rather than NaN or a panic.

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator), 0.0 below two samples
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// `count / total`, 0.0 when `total` is zero
pub fn proportion(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[500.0, 520.0, 480.0]) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[400.0]), 0.0);
        // [500, 520, 480]: deviations 0, 20, -20 -> 800 / 2 = 400 -> 20
        assert!((sample_std_dev(&[500.0, 520.0, 480.0]) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_proportion() {
        assert_eq!(proportion(3, 0), 0.0);
        assert!((proportion(1, 4) - 0.25).abs() < 1e-12);
    }
}
