//! Chunk loudness estimation.

/// Mean absolute amplitude of a chunk in raw 16-bit units.
///
/// Returns 0.0 for an empty chunk. Pure function, no state.
pub fn mean_amplitude(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: u64 = samples
        .iter()
        .map(|&sample| sample.unsigned_abs() as u64)
        .sum();

    (sum as f64 / samples.len() as f64) as f32
}
