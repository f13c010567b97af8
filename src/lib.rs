/*!
 * Undertone Steganography Library
 *
 * This library hides arbitrary binary payloads inside audio signals by
 * perturbing the magnitudes of selected time-frequency cells of the
 * signal's STFT, and recovers them by re-reading those same cells.
 *
 * Main components:
 * - stego: Core embedding engine (carrier selection, traversal, parity
 *   codec, length-prefixed payload framing)
 * - spectrum: Forward/inverse STFT of a mono waveform
 * - audio: WAV file loading and writing
 * - pipeline: File-level orchestration tying the above together
 */

use thiserror::Error;

pub mod audio;
pub mod pipeline;
pub mod spectrum;
pub mod stego;
pub mod utils;

/// Error type for the library
#[derive(Error, Debug)]
pub enum UndertoneError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Payload needs {required} carrier bits but the cover only provides {available}")]
    CapacityExceeded { required: usize, available: usize },

    #[error("Carrier stream exhausted after {actual} of {expected} bits")]
    TruncatedStream { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UndertoneError>;

pub use pipeline::{embed_file, extract_file, probe_capacity, EmbedReport};
pub use spectrum::{Spectrogram, StftParams};
pub use stego::{embed, extract, CarrierMap, EmbedOutcome, EmbedParams};
