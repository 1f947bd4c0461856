//! Contamination score of a ring relative to the profile background.

/// Median of `values` (mean of the two middle values for even lengths).
///
/// Returns 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Relative excess of `intensity` over `background`, in percent, clamped to `[0, 100]`.
///
/// A zero background scores 0.
pub fn contamination_level(intensity: f64, background: f64) -> f64 {
    if background == 0.0 {
        return 0.0;
    }
    (((intensity - background) / background) * 100.0).clamp(0.0, 100.0)
}
