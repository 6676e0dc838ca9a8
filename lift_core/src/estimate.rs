//! Estimated one-rep-max and the rounding helpers shared by the pipeline.

/// Rep counts are clamped into this range before estimating
pub const MIN_ESTIMATE_REPS: f64 = 1.0;
pub const MAX_ESTIMATE_REPS: f64 = 20.0;

/// Linear Epley-style estimate: `weight * (1 + reps / 30)`.
///
/// Reps are rounded and clamped to `[1, 20]`; the result is rounded to two
/// decimals. Returns `0.0` for a non-finite or non-positive weight.
pub fn estimate_e1rm(weight_kg: f64, reps: f64) -> f64 {
    if !weight_kg.is_finite() || weight_kg <= 0.0 || !reps.is_finite() {
        return 0.0;
    }
    let reps = reps.round().clamp(MIN_ESTIMATE_REPS, MAX_ESTIMATE_REPS);
    round2(weight_kg * (1.0 + reps / 30.0))
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
