// linear_index.rs
//
// A dense array of one minimum virtual offset per 16 kb window of a
// reference, used to prune chunk lists at query time: nothing below
// `linear[window_of(query_start)]` can overlap the query.

use crate::binning::LEVEL_STARTS;
use crate::voffset::VirtualOffset;

/// Window width in bases (same as the leaf bin span).
const WINDOW_SHIFT: u32 = 14;

/// Matches samtools: enough windows to cover the full 512 Mb reference span
/// at the leaf bin's per-level bin count.
pub const MAX_LINEAR_INDEX_SIZE: usize = (37_450 - LEVEL_STARTS[5] as usize) + 1;

pub fn window_of(pos_1b: i64) -> usize {
    let pos0 = if pos_1b <= 0 { 0 } else { pos_1b - 1 };
    (pos0 >> WINDOW_SHIFT) as usize
}

#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    offsets: Vec<VirtualOffset>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self { offsets: Vec::new() }
    }

    pub fn from_entries(offsets: Vec<VirtualOffset>) -> Self {
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn entries(&self) -> &[VirtualOffset] {
        &self.offsets
    }

    /// Record that `chunk_begin` is (a candidate for) the minimum offset at
    /// which a record starting in window `window` could be found. Grows the
    /// backing array and zero-fills any newly exposed windows.
    pub fn update(&mut self, window: usize, chunk_begin: VirtualOffset) {
        if window >= self.offsets.len() {
            self.offsets.resize(window + 1, VirtualOffset::MIN);
        }
        let slot = &mut self.offsets[window];
        if *slot == VirtualOffset::MIN || chunk_begin < *slot {
            *slot = chunk_begin;
        }
    }

    /// Fill any zero (unset) slot with the last non-zero value seen before
    /// it, matching samtools' carryover behaviour. A no-op on an index with
    /// no gaps.
    pub fn fill_gaps(&mut self) {
        let mut last = VirtualOffset::MIN;
        for slot in &mut self.offsets {
            if *slot == VirtualOffset::MIN {
                *slot = last;
            } else {
                last = *slot;
            }
        }
    }

    /// The minimum virtual offset below which no record can overlap a query
    /// starting at `pos_1b`. Zero if the position falls outside the array.
    pub fn min_offset(&self, pos_1b: i64) -> VirtualOffset {
        let window = window_of(pos_1b);
        self.offsets.get(window).copied().unwrap_or(VirtualOffset::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_of_boundaries() {
        assert_eq!(window_of(1), 0);
        assert_eq!(window_of(16384), 0);
        assert_eq!(window_of(16385), 1);
    }

    #[test]
    fn update_tracks_minimum_per_window() {
        let mut idx = LinearIndex::new();
        idx.update(0, VirtualOffset::new(100, 0));
        idx.update(0, VirtualOffset::new(50, 0));
        assert_eq!(idx.min_offset(1), VirtualOffset::new(50, 0));
    }

    #[test]
    fn fill_gaps_carries_forward_last_seen() {
        let mut idx = LinearIndex::new();
        idx.update(0, VirtualOffset::new(10, 0));
        idx.update(3, VirtualOffset::new(40, 0));
        idx.fill_gaps();
        assert_eq!(idx.entries()[1], VirtualOffset::new(10, 0));
        assert_eq!(idx.entries()[2], VirtualOffset::new(10, 0));
        assert_eq!(idx.entries()[3], VirtualOffset::new(40, 0));
    }

    #[test]
    fn min_offset_outside_range_is_zero() {
        let idx = LinearIndex::new();
        assert_eq!(idx.min_offset(1_000_000), VirtualOffset::MIN);
    }
}
