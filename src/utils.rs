/*!
Utility functions for common operations used across the codebase.

This module provides various helper functions for:
- Linear amplitude / decibel conversion
- FFT bin to frequency mapping

The utilities here are designed to be reusable components shared by the
carrier selection and parity codec layers.
*/

/// Floor substituted for non-positive magnitudes before taking the log.
/// Keeps the dB computation defined everywhere (-200 dB).
pub const MIN_MAGNITUDE: f32 = 1e-10;

/// Convert a linear magnitude to decibels (20 * log10).
///
/// Non-positive magnitudes are clamped to [`MIN_MAGNITUDE`] so the result
/// is always finite.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(MIN_MAGNITUDE).log10()
}

/// Convert a decibel value back to a linear magnitude.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Floor-parity of a dB value: `floor(db) mod 2` with Euclidean modulo,
/// so negative dB values behave the same way numpy's `%` does.
pub fn floor_parity(db: f32) -> bool {
    (db.floor() as i64).rem_euclid(2) == 1
}

/// Center frequencies of the `n_fft / 2 + 1` one-sided FFT bins for the
/// given sample rate.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}
