/*!
 * Length-prefixed bit framing of the payload.
 *
 * The wire format is an `offset`-bit big-endian unsigned bit length
 * followed immediately by the payload bits, MSB-first within each byte.
 * The two parts flow through one continuous carrier walk, so the prefix's
 * last cell is directly followed by the payload's first cell.
 */

use crate::{Result, UndertoneError};

/// Expand `payload` into the framed bit stream: `offset` length bits, then
/// the payload bits MSB-first.
///
/// Fails if the payload's bit length does not fit in `offset` bits; that
/// is a caller configuration problem, not a runtime corruption.
pub fn frame_bits(payload: &[u8], offset: u32) -> Result<Vec<bool>> {
    if offset == 0 || offset > 64 {
        return Err(UndertoneError::Configuration(format!(
            "offset must be between 1 and 64 bits, got {}",
            offset
        )));
    }
    let bit_len = payload.len() as u64 * 8;
    if offset < 64 && bit_len >> offset != 0 {
        return Err(UndertoneError::Configuration(format!(
            "payload of {} bits does not fit in a {}-bit length prefix",
            bit_len, offset
        )));
    }

    let mut bits = Vec::with_capacity(offset as usize + bit_len as usize);
    for shift in (0..offset).rev() {
        bits.push(bit_len >> shift & 1 == 1);
    }
    for &byte in payload {
        for shift in (0..8).rev() {
            bits.push(byte >> shift & 1 == 1);
        }
    }
    Ok(bits)
}

/// Pack extracted bits into bytes, MSB-first. A trailing partial byte is
/// zero-padded in its low-order bits.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit as u8) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}
