/*!
 * WAV loading and writing.
 *
 * Covers the file formats the tool actually meets: integer (8/16/24/32
 * bit) and 32-bit float PCM. Multi-channel input is mixed down to mono,
 * since the engine embeds into a single magnitude matrix; output is
 * always mono 32-bit float, which round-trips the mutated spectrum
 * without requantization loss.
 */

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::Result;

/// Read a WAV file as mono `f32` samples in `[-1, 1]` plus its sample rate.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    debug!(
        "Read {:?}: {} samples at {} Hz ({} channel(s), {:?})",
        path,
        samples.len(),
        spec.sample_rate,
        channels,
        spec.sample_format
    );
    Ok((samples, spec.sample_rate))
}

/// Write mono `f32` samples as a 32-bit float WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    debug!("Wrote {:?}: {} samples at {} Hz", path, samples.len(), sample_rate);
    Ok(())
}
