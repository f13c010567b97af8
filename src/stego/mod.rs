/*!
 * Core spectrogram embedding engine.
 *
 * Hides a length-prefixed bit stream in the floor-dB parity of selected
 * STFT magnitude cells. Key pieces:
 *
 * - carrier: Builds the map of eligible (frame, bin) carrier cells
 * - walk: Deterministic traversal order over carrier cells
 * - parity: One-bit read/write at a single cell with minimal perturbation
 * - payload: Length-prefixed bit framing of the payload bytes
 *
 * The engine operates on a magnitude matrix indexed `[bin][frame]` that is
 * exclusively owned by the caller for the duration of one call. Embedding
 * mutates it in place; extraction only reads it.
 */

pub mod carrier;
pub mod parity;
pub mod payload;
pub mod walk;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Result, UndertoneError};
pub use carrier::CarrierMap;
pub use walk::{CarrierWalk, Cell};

/// Tunable parameters of the embedding engine.
///
/// The field names match the options recognized on the command line and in
/// JSON settings files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedParams {
    /// Minimum carrier frequency in Hz. Bins below this are never touched.
    pub hz: f32,
    /// Minimum carrier level in dB. Cells quieter than this are ineligible.
    pub amplitude: f32,
    /// Width of the length prefix in bits (1..=64).
    pub offset: u32,
    /// Fraction of frames eligible as carriers, from the start of the signal.
    pub x_ratio: f32,
    /// dB floor below which the reader falls back to a 0 bit instead of
    /// trusting the cell's parity.
    pub reader_thresh: f32,
    /// dB boost applied when a cell's parity must be flipped.
    pub boost_db: f32,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            hz: 15000.0,
            amplitude: -55.0,
            offset: 32,
            x_ratio: 1.0,
            reader_thresh: -75.0,
            boost_db: 1.0,
        }
    }
}

impl EmbedParams {
    /// Check parameter ranges that would otherwise only fail deep inside a
    /// run. Called by both engines before touching the matrix.
    pub fn validate(&self) -> Result<()> {
        if self.offset == 0 || self.offset > 64 {
            return Err(UndertoneError::Configuration(format!(
                "offset must be between 1 and 64 bits, got {}",
                self.offset
            )));
        }
        if !(self.x_ratio > 0.0 && self.x_ratio <= 1.0) {
            return Err(UndertoneError::Configuration(format!(
                "x_ratio must be within (0, 1], got {}",
                self.x_ratio
            )));
        }
        if self.boost_db <= 0.0 {
            return Err(UndertoneError::Configuration(format!(
                "boost_db must be positive, got {}",
                self.boost_db
            )));
        }
        Ok(())
    }
}

/// Result of one embedding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOutcome {
    /// Total carrier cells available in the map.
    pub capacity: usize,
    /// Bits written (length prefix + payload).
    pub bits_written: usize,
    /// Cells whose parity actually had to be flipped.
    pub modified: usize,
}

/// Embed `payload` into the magnitude matrix at the cells of `map`.
///
/// Writes an `offset`-bit big-endian length prefix followed by the payload
/// bits, walking the carrier map in its canonical order. Fails with
/// [`UndertoneError::CapacityExceeded`] before any mutation if the map
/// cannot hold the full stream.
pub fn embed(
    mag: &mut [Vec<f32>],
    map: &CarrierMap,
    payload: &[u8],
    params: &EmbedParams,
) -> Result<EmbedOutcome> {
    params.validate()?;
    let bits = payload::frame_bits(payload, params.offset)?;
    let capacity = map.capacity();
    if capacity < bits.len() {
        return Err(UndertoneError::CapacityExceeded {
            required: bits.len(),
            available: capacity,
        });
    }

    let mut modified = 0usize;
    for (&bit, cell) in bits.iter().zip(CarrierWalk::new(map)) {
        if parity::write_bit(mag, cell, bit, params.boost_db) {
            modified += 1;
        }
    }

    info!(
        "Embedded {} bits into {} carrier cells, {} modified",
        bits.len(),
        capacity,
        modified
    );
    Ok(EmbedOutcome {
        capacity,
        bits_written: bits.len(),
        modified,
    })
}

/// Extract a payload from the magnitude matrix at the cells of `map`.
///
/// Reads the `offset`-bit length prefix, then exactly that many payload
/// bits, and packs them into bytes MSB-first. Fails with
/// [`UndertoneError::TruncatedStream`] if the carrier map runs out of cells
/// before the stream is complete.
pub fn extract(mag: &[Vec<f32>], map: &CarrierMap, params: &EmbedParams) -> Result<Vec<u8>> {
    params.validate()?;
    let capacity = map.capacity();
    let offset = params.offset as usize;
    let mut walk = CarrierWalk::new(map);

    let mut bit_len = 0u64;
    for read in 0..offset {
        let cell = walk.next().ok_or(UndertoneError::TruncatedStream {
            expected: offset,
            actual: read,
        })?;
        bit_len = bit_len << 1 | parity::read_bit(mag, cell, params.reader_thresh) as u64;
    }
    debug!("Length prefix announces {} payload bits", bit_len);

    // The prefix comes from whatever the cells happen to hold: mismatched
    // parameters or corrupted audio can announce any length up to
    // 2^offset - 1. Bound it by the cells the map can still supply before
    // doing any arithmetic or allocation with it.
    if bit_len > (capacity - offset) as u64 {
        return Err(UndertoneError::TruncatedStream {
            expected: offset.saturating_add(usize::try_from(bit_len).unwrap_or(usize::MAX)),
            actual: capacity,
        });
    }

    let expected = offset + bit_len as usize;
    let mut bits = Vec::with_capacity(bit_len as usize);
    for read in 0..bit_len as usize {
        let cell = walk.next().ok_or(UndertoneError::TruncatedStream {
            expected,
            actual: offset + read,
        })?;
        bits.push(parity::read_bit(mag, cell, params.reader_thresh));
    }

    Ok(payload::pack_bits(&bits))
}
