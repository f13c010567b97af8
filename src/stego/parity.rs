/*!
 * One-bit parity codec over a single magnitude cell.
 *
 * A cell stores a bit in the parity of its floored dB level:
 * `floor(20 * log10(mag)) mod 2`. Writing only touches a cell whose
 * current parity disagrees with the target bit, and then only raises it
 * by a small dB boost; reading below a detection floor yields a 0 bit
 * instead of an error, tolerating quantization drift between the write
 * and read passes.
 */

use super::Cell;
use crate::utils::{amplitude_to_db, db_to_amplitude, floor_parity};

/// Read the bit stored at `cell`.
///
/// Levels at or below `reader_thresh` decode as `0` rather than failing:
/// the fallback trades false zero bits for robustness against dB drift.
pub fn read_bit(mag: &[Vec<f32>], cell: Cell, reader_thresh: f32) -> bool {
    let db = amplitude_to_db(mag[cell.bin][cell.frame]);
    if db <= reader_thresh {
        return false;
    }
    floor_parity(db)
}

/// Write `bit` at `cell`, returning whether the cell was modified.
///
/// Cells already holding the right parity are left untouched. Otherwise
/// the level is raised in steps of `boost_db` until the floored parity
/// flips; the default +1 dB flips it in a single step. The write is
/// cell-local and monotonic, and re-applying the same bit is a no-op.
pub fn write_bit(mag: &mut [Vec<f32>], cell: Cell, bit: bool, boost_db: f32) -> bool {
    let db = amplitude_to_db(mag[cell.bin][cell.frame]);
    let parity = floor_parity(db);
    if parity == bit {
        return false;
    }
    let mut boosted = db + boost_db;
    while floor_parity(boosted) == parity {
        boosted += boost_db;
    }
    mag[cell.bin][cell.frame] = db_to_amplitude(boosted);
    true
}
