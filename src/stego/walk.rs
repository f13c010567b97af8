/*!
 * Deterministic traversal over carrier cells.
 *
 * The walk visits one carrier per frame across the whole coverage window
 * before descending to the next slot: depth 0 of every frame, then depth 1,
 * and so on. Spreading writes across time before stacking them inside a
 * single frame keeps the perturbations from clustering audibly. Frames
 * whose carrier list is shorter than the current depth are skipped.
 */

use super::CarrierMap;

/// One carrier cell: the `bin`-th row of the `frame`-th column of the
/// magnitude matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub bin: usize,
    pub frame: usize,
}

/// Iterator yielding carrier cells in the canonical embed/extract order.
///
/// A pure function of the map: two walks over the same map always produce
/// the same sequence. Yields exactly `map.capacity()` cells, then `None`;
/// callers that need more than that must bail out upstream via the
/// capacity check.
pub struct CarrierWalk<'a> {
    map: &'a CarrierMap,
    frame: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> CarrierWalk<'a> {
    pub fn new(map: &'a CarrierMap) -> Self {
        Self {
            map,
            frame: 0,
            depth: 0,
            max_depth: map.max_depth(),
        }
    }
}

impl Iterator for CarrierWalk<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        loop {
            if self.depth >= self.max_depth {
                return None;
            }
            if self.frame >= self.map.frames() {
                self.frame = 0;
                self.depth += 1;
                continue;
            }
            let frame = self.frame;
            self.frame += 1;
            if let Some(&bin) = self.map.bins(frame).get(self.depth) {
                return Some(Cell { bin, frame });
            }
        }
    }
}
