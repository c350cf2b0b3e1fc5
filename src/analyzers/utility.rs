/// Arithmetic mean of a slice of values. `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds to one decimal place, ties to even (`2.25` -> `2.2`, `0.75` -> `0.8`).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
