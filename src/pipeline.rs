/*!
 * File-level orchestration.
 *
 * Ties the collaborators together: cover WAV -> STFT -> carrier map ->
 * embed -> inverse STFT -> stego WAV, and the reverse path for
 * extraction. The magnitude matrix is owned exclusively by one call for
 * its whole duration; the phase matrix passes through untouched.
 *
 * Note that the parity boost is not guaranteed to survive the audio
 * round trip bit-for-bit: the mutated spectrogram is generally not the
 * exact STFT of any waveform, so re-analysis drifts by a fraction of a
 * dB. The `reader_thresh` slack exists for exactly that; how much drift
 * a given cover tolerates is an empirical question.
 */

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::spectrum::{self, StftParams};
use crate::stego::{self, CarrierMap, EmbedParams};
use crate::{audio, Result};

/// Everything one run needs: transform geometry plus engine tunables.
/// Loadable from a JSON settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stft: StftParams,
    pub embed: EmbedParams,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Observables of one embedding run.
#[derive(Debug, Clone, Copy)]
pub struct EmbedReport {
    /// Carrier cells available in the cover.
    pub capacity: usize,
    /// Bits written (length prefix + payload).
    pub bits_written: usize,
    /// Cells whose parity had to be flipped.
    pub modified: usize,
    /// Frames inside the coverage window.
    pub frames: usize,
}

/// Embed `payload` into the cover WAV at `cover`, writing the stego WAV
/// to `output`.
pub fn embed_file(
    cover: &Path,
    payload: &[u8],
    output: &Path,
    settings: &Settings,
) -> Result<EmbedReport> {
    let (samples, sample_rate) = audio::read_wav(cover)?;
    let mut spec = spectrum::stft(&samples, &settings.stft)?;
    let map = CarrierMap::build(&spec.mag, sample_rate, settings.stft.n_fft, &settings.embed)?;
    let outcome = stego::embed(&mut spec.mag, &map, payload, &settings.embed)?;

    let stego_samples = spectrum::istft(&spec, &settings.stft, Some(samples.len()))?;
    audio::write_wav(output, &stego_samples, sample_rate)?;

    info!(
        "Embedded {} payload bytes into {:?}: capacity {} bits, {} cells modified",
        payload.len(),
        output,
        outcome.capacity,
        outcome.modified
    );
    Ok(EmbedReport {
        capacity: outcome.capacity,
        bits_written: outcome.bits_written,
        modified: outcome.modified,
        frames: map.frames(),
    })
}

/// Recover a payload from the stego WAV at `path`.
pub fn extract_file(path: &Path, settings: &Settings) -> Result<Vec<u8>> {
    let (samples, sample_rate) = audio::read_wav(path)?;
    let spec = spectrum::stft(&samples, &settings.stft)?;
    let map = CarrierMap::build(&spec.mag, sample_rate, settings.stft.n_fft, &settings.embed)?;
    let payload = stego::extract(&spec.mag, &map, &settings.embed)?;
    info!("Extracted {} payload bytes from {:?}", payload.len(), path);
    Ok(payload)
}

/// How many carrier bits the cover at `path` offers under `settings`.
pub fn probe_capacity(path: &Path, settings: &Settings) -> Result<usize> {
    let (samples, sample_rate) = audio::read_wav(path)?;
    let spec = spectrum::stft(&samples, &settings.stft)?;
    let map = CarrierMap::build(&spec.mag, sample_rate, settings.stft.n_fft, &settings.embed)?;
    Ok(map.capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("undertone_pipeline_{name}.wav"))
    }

    /// Noisy cover with broadband energy so plenty of cells clear the
    /// amplitude threshold.
    fn write_noise_cover(path: &Path, len: usize) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let samples: Vec<f32> = (0..len).map(|_| rng.gen_range(-0.8f32..0.8)).collect();
        audio::write_wav(path, &samples, 16000).unwrap();
    }

    fn settings() -> Settings {
        Settings {
            stft: StftParams {
                n_fft: 256,
                hop_length: 64,
                win_length: 256,
                center: true,
            },
            embed: EmbedParams {
                hz: 2000.0,
                amplitude: -80.0,
                offset: 16,
                x_ratio: 1.0,
                reader_thresh: -100.0,
                boost_db: 1.0,
            },
        }
    }

    #[test]
    fn test_probe_capacity_of_noise() {
        let cover = temp_path("capacity");
        write_noise_cover(&cover, 16000);
        let capacity = probe_capacity(&cover, &settings()).unwrap();
        // broadband noise: nearly every in-window cell should qualify
        assert!(capacity > 10_000, "capacity {capacity}");
        let _ = std::fs::remove_file(&cover);
    }

    #[test]
    fn test_embed_file_writes_stego_wav() {
        let cover = temp_path("embed_cover");
        let output = temp_path("embed_out");
        write_noise_cover(&cover, 16000);

        let report = embed_file(&cover, b"hidden payload", &output, &settings()).unwrap();
        assert_eq!(report.bits_written, 16 + 14 * 8);
        assert!(report.capacity >= report.bits_written);
        assert!(report.modified <= report.bits_written);
        assert!(output.exists());

        let (samples, sr) = audio::read_wav(&output).unwrap();
        assert_eq!(sr, 16000);
        assert_eq!(samples.len(), 16000);

        let _ = std::fs::remove_file(&cover);
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn test_embed_rejects_oversized_payload() {
        let cover = temp_path("oversized");
        let output = temp_path("oversized_out");
        write_noise_cover(&cover, 4000);
        let mut s = settings();
        s.embed.x_ratio = 0.05; // starve the coverage window

        let payload = vec![0u8; 4096];
        let err = embed_file(&cover, &payload, &output, &s).unwrap_err();
        assert!(matches!(
            err,
            crate::UndertoneError::CapacityExceeded { .. }
        ));
        assert!(!output.exists(), "no stego file on the failure path");
        let _ = std::fs::remove_file(&cover);
    }

    #[test]
    fn test_settings_from_json() {
        let path = env::temp_dir().join("undertone_settings.json");
        fs::write(
            &path,
            r#"{"stft": {"n_fft": 1024}, "embed": {"hz": 12000.0, "offset": 24}}"#,
        )
        .unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.stft.n_fft, 1024);
        // unspecified fields fall back to defaults
        assert_eq!(s.stft.hop_length, 512);
        assert_eq!(s.embed.offset, 24);
        assert!((s.embed.hz - 12000.0).abs() < f32::EPSILON);
        let _ = fs::remove_file(&path);
    }
}
