/*!
 * Forward and inverse short-time Fourier transform.
 *
 * Produces the magnitude/phase representation the embedding engine works
 * on, and turns a (possibly mutated) magnitude matrix plus the untouched
 * phase back into a waveform. Frames are Hann-windowed with configurable
 * FFT size, hop and window length; centering reflect-pads the signal by
 * half an FFT size so frame `t` is centered on sample `t * hop`.
 *
 * The inverse overlap-adds the windowed frames and normalizes by the
 * accumulated squared window, the standard least-squares reconstruction.
 */

use rustfft::{num_complex::Complex32, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::{Result, UndertoneError};

/// Guard against amplification of silence when normalizing the overlap-add.
const NORM_EPSILON: f32 = 1e-8;

/// Geometry of the time-frequency transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StftParams {
    /// FFT size; the matrix has `n_fft / 2 + 1` frequency bins.
    pub n_fft: usize,
    /// Samples between consecutive frames.
    pub hop_length: usize,
    /// Window length; zero-padded symmetrically up to `n_fft` if shorter.
    pub win_length: usize,
    /// Reflect-pad the signal by `n_fft / 2` on both ends so frames are
    /// centered on their hop positions.
    pub center: bool,
}

impl Default for StftParams {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            win_length: 2048,
            center: true,
        }
    }
}

impl StftParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_fft < 2 || self.n_fft % 2 != 0 {
            return Err(UndertoneError::Configuration(format!(
                "n_fft must be an even number >= 2, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(UndertoneError::Configuration(
                "hop_length must be positive".to_string(),
            ));
        }
        if self.win_length == 0 || self.win_length > self.n_fft {
            return Err(UndertoneError::Configuration(format!(
                "win_length must be within 1..={}, got {}",
                self.n_fft, self.win_length
            )));
        }
        Ok(())
    }

    /// Periodic Hann window of `win_length`, centered in an `n_fft` buffer.
    fn window(&self) -> Vec<f32> {
        let mut w = vec![0.0f32; self.n_fft];
        let offset = (self.n_fft - self.win_length) / 2;
        for n in 0..self.win_length {
            let x = 2.0 * std::f32::consts::PI * n as f32 / self.win_length as f32;
            w[offset + n] = 0.5 * (1.0 - x.cos());
        }
        w
    }
}

/// One-sided magnitude and phase matrices, both indexed `[bin][frame]`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub mag: Vec<Vec<f32>>,
    pub phase: Vec<Vec<f32>>,
}

impl Spectrogram {
    pub fn bins(&self) -> usize {
        self.mag.len()
    }

    pub fn frames(&self) -> usize {
        self.mag.first().map(|row| row.len()).unwrap_or(0)
    }
}

/// Reflect-pad `samples` by `pad` on both ends.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        out.push(samples[i.min(n - 1)]);
    }
    out.extend_from_slice(samples);
    for i in (0..pad).map(|i| n.saturating_sub(2 + i)) {
        out.push(samples[i]);
    }
    out
}

/// Compute the STFT of a mono signal.
pub fn stft(samples: &[f32], params: &StftParams) -> Result<Spectrogram> {
    params.validate()?;
    let n_fft = params.n_fft;
    if samples.is_empty() || (!params.center && samples.len() < n_fft) {
        return Err(UndertoneError::Configuration(format!(
            "signal of {} samples is too short for n_fft {}",
            samples.len(),
            n_fft
        )));
    }

    let padded;
    let signal: &[f32] = if params.center {
        padded = reflect_pad(samples, n_fft / 2);
        &padded
    } else {
        samples
    };

    let window = params.window();
    let n_frames = (signal.len() - n_fft) / params.hop_length + 1;
    let n_bins = n_fft / 2 + 1;

    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let mut mag = vec![vec![0.0f32; n_frames]; n_bins];
    let mut phase = vec![vec![0.0f32; n_frames]; n_bins];
    let mut buf = vec![Complex32::new(0.0, 0.0); n_fft];

    for frame in 0..n_frames {
        let start = frame * params.hop_length;
        for i in 0..n_fft {
            buf[i] = Complex32::new(signal[start + i] * window[i], 0.0);
        }
        fft.process(&mut buf);
        for bin in 0..n_bins {
            mag[bin][frame] = buf[bin].norm();
            phase[bin][frame] = buf[bin].arg();
        }
    }

    Ok(Spectrogram { mag, phase })
}

/// Invert a spectrogram back into a waveform.
///
/// `length` trims (or zero-pads) the result to the original signal length;
/// without it the result keeps whatever the overlap-add produced after the
/// centering pad is removed.
pub fn istft(spec: &Spectrogram, params: &StftParams, length: Option<usize>) -> Result<Vec<f32>> {
    params.validate()?;
    let n_fft = params.n_fft;
    let n_bins = n_fft / 2 + 1;
    if spec.bins() != n_bins {
        return Err(UndertoneError::Configuration(format!(
            "spectrogram has {} bins but n_fft {} implies {}",
            spec.bins(),
            n_fft,
            n_bins
        )));
    }

    let n_frames = spec.frames();
    let window = params.window();
    let out_len = n_fft + params.hop_length * n_frames.saturating_sub(1);
    let mut out = vec![0.0f32; out_len];
    let mut norm = vec![0.0f32; out_len];

    let ifft = FftPlanner::<f32>::new().plan_fft_inverse(n_fft);
    let mut buf = vec![Complex32::new(0.0, 0.0); n_fft];

    for frame in 0..n_frames {
        for bin in 0..n_bins {
            buf[bin] = Complex32::from_polar(spec.mag[bin][frame], spec.phase[bin][frame]);
        }
        // Hermitian mirror for the real inverse transform.
        for bin in n_bins..n_fft {
            buf[bin] = buf[n_fft - bin].conj();
        }
        ifft.process(&mut buf);

        let start = frame * params.hop_length;
        for i in 0..n_fft {
            let sample = buf[i].re / n_fft as f32;
            out[start + i] += sample * window[i];
            norm[start + i] += window[i] * window[i];
        }
    }

    for (sample, &w) in out.iter_mut().zip(norm.iter()) {
        if w > NORM_EPSILON {
            *sample /= w;
        }
    }

    if params.center {
        let pad = n_fft / 2;
        out.drain(..pad.min(out.len()));
        out.truncate(out.len().saturating_sub(pad));
    }
    if let Some(len) = length {
        out.resize(len, 0.0);
    }
    Ok(out)
}
