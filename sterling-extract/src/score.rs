//! Converts the reconciliation error count into a 0-100 confidence figure.

/// `100 * (count - errors) / count`, clamped to [0, 100], two decimals.
/// Zero transactions score zero: nothing extracted earns no confidence.
pub fn score(count: usize, errors: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }

    let accuracy = ((count as f64 - errors as f64) / count as f64) * 100.0;
    (accuracy.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
