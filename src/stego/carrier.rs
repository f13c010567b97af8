/*!
 * Carrier cell selection.
 *
 * Scans the magnitude matrix for time-frequency cells that can hold a bit
 * without becoming audible: bins at or above a minimum frequency whose
 * level clears a minimum dB threshold. Only the leading
 * `floor(frames * x_ratio)` frames are eligible; each eligible frame
 * contributes an ascending list of bin indices. Both the writer and the
 * reader build the map with the same policy, so a map derived from the
 * same matrix and parameters always lines up on both sides.
 */

use rayon::prelude::*;
use tracing::debug;

use super::EmbedParams;
use crate::utils::{amplitude_to_db, fft_frequencies};
use crate::{Result, UndertoneError};

/// Per-frame lists of eligible carrier bins, in ascending bin order.
///
/// The lists are ragged: a quiet frame may contribute nothing at all.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierMap {
    frames: Vec<Vec<usize>>,
}

impl CarrierMap {
    /// Build the carrier map for a magnitude matrix indexed `[bin][frame]`.
    ///
    /// `n_fft` is the FFT size the matrix was produced with; it determines
    /// the bin-to-Hz mapping together with `sample_rate`. Fails with a
    /// configuration error if `params.hz` lies above the highest bin
    /// frequency, before any scan. The matrix itself is never touched.
    pub fn build(
        mag: &[Vec<f32>],
        sample_rate: u32,
        n_fft: usize,
        params: &EmbedParams,
    ) -> Result<Self> {
        params.validate()?;
        let freqs = fft_frequencies(sample_rate, n_fft);
        let start = freqs
            .iter()
            .position(|&f| f >= params.hz)
            .ok_or_else(|| {
                UndertoneError::Configuration(format!(
                    "hz must be at or below the top STFT bin frequency ({:.1} Hz), got {:.1} Hz",
                    freqs.last().copied().unwrap_or(0.0),
                    params.hz
                ))
            })?;

        let n_bins = mag.len();
        let n_frames = mag.first().map(|row| row.len()).unwrap_or(0);
        let limit = ((n_frames as f32 * params.x_ratio).floor() as usize).min(n_frames);

        // Frames are independent, so the scan parallelizes per frame; the
        // indexed collect keeps the frame order intact.
        let frames: Vec<Vec<usize>> = (0..limit)
            .into_par_iter()
            .map(|frame| {
                (start..n_bins)
                    .filter(|&bin| amplitude_to_db(mag[bin][frame]) >= params.amplitude)
                    .collect()
            })
            .collect();

        let map = Self { frames };
        debug!(
            "Carrier map: {} frames in coverage window, {} cells, bins start at {}",
            limit,
            map.capacity(),
            start
        );
        Ok(map)
    }

    /// Construct a map directly from per-frame bin lists.
    pub fn from_frames(frames: Vec<Vec<usize>>) -> Self {
        Self { frames }
    }

    /// Total number of carrier cells across all frames.
    pub fn capacity(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    /// Number of frames inside the coverage window.
    pub fn frames(&self) -> usize {
        self.frames.len()
    }

    /// Carrier bins of one frame, ascending.
    pub fn bins(&self, frame: usize) -> &[usize] {
        &self.frames[frame]
    }

    /// Length of the longest per-frame list (the deepest slot any walk
    /// can reach).
    pub fn max_depth(&self) -> usize {
        self.frames.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::db_to_amplitude;

    /// 9-bin matrix (n_fft = 16) at `sr` with everything silent except the
    /// cells set explicitly.
    fn quiet_matrix(frames: usize) -> Vec<Vec<f32>> {
        vec![vec![db_to_amplitude(-90.0); frames]; 9]
    }

    fn params() -> EmbedParams {
        EmbedParams {
            hz: 3000.0,
            amplitude: -50.0,
            ..EmbedParams::default()
        }
    }

    #[test]
    fn test_selects_loud_cells_above_hz() {
        let mut mag = quiet_matrix(4);
        // sr 16000, n_fft 16 -> bin spacing 1000 Hz; hz 3000 -> start bin 3.
        mag[3][0] = db_to_amplitude(-40.0);
        mag[5][0] = db_to_amplitude(-10.0);
        mag[2][0] = db_to_amplitude(-5.0); // below hz, must be ignored
        mag[4][2] = db_to_amplitude(-49.9);

        let map = CarrierMap::build(&mag, 16000, 16, &params()).unwrap();
        assert_eq!(map.frames(), 4);
        assert_eq!(map.bins(0), &[3, 5]);
        assert_eq!(map.bins(1), &[] as &[usize]);
        assert_eq!(map.bins(2), &[4]);
        assert_eq!(map.capacity(), 3);
    }

    #[test]
    fn test_bins_listed_ascending() {
        let mut mag = quiet_matrix(1);
        for bin in [8, 4, 6, 3] {
            mag[bin][0] = db_to_amplitude(-20.0);
        }
        let map = CarrierMap::build(&mag, 16000, 16, &params()).unwrap();
        assert_eq!(map.bins(0), &[3, 4, 6, 8]);
    }

    #[test]
    fn test_x_ratio_limits_coverage_window() {
        let mut mag = quiet_matrix(10);
        for frame in 0..10 {
            mag[5][frame] = db_to_amplitude(-20.0);
        }
        let p = EmbedParams {
            x_ratio: 0.55,
            ..params()
        };
        let map = CarrierMap::build(&mag, 16000, 16, &p).unwrap();
        // floor(10 * 0.55) = 5 frames
        assert_eq!(map.frames(), 5);
        assert_eq!(map.capacity(), 5);
    }

    #[test]
    fn test_hz_above_nyquist_is_configuration_error() {
        let mag = quiet_matrix(4);
        let p = EmbedParams {
            hz: 8000.1, // Nyquist for sr 16000 is 8000
            ..params()
        };
        assert!(matches!(
            CarrierMap::build(&mag, 16000, 16, &p),
            Err(UndertoneError::Configuration(_))
        ));
        // Exactly Nyquist is still representable.
        let p = EmbedParams {
            hz: 8000.0,
            ..params()
        };
        assert!(CarrierMap::build(&mag, 16000, 16, &p).is_ok());
    }

    #[test]
    fn test_zero_magnitude_cells_are_defined() {
        let mut mag = quiet_matrix(2);
        mag[4][0] = 0.0; // clamped to the floor, far below any threshold
        let map = CarrierMap::build(&mag, 16000, 16, &params()).unwrap();
        assert_eq!(map.capacity(), 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut mag = quiet_matrix(32);
        for frame in 0..32 {
            for bin in 3..9 {
                if (frame + bin) % 3 != 0 {
                    mag[bin][frame] = db_to_amplitude(-30.0);
                }
            }
        }
        let a = CarrierMap::build(&mag, 16000, 16, &params()).unwrap();
        let b = CarrierMap::build(&mag, 16000, 16, &params()).unwrap();
        assert_eq!(a, b);
    }
}
