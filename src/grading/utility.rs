/// Arithmetic mean of a batch of marks.
///
/// Returns 0.0 for an empty slice; [`z_scores`](super::relative::z_scores)
/// rejects empty batches before calling this.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor N, not N - 1) around `mean`.
/// Returns 0.0 for an empty slice.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}
