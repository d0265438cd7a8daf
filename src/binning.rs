// binning.rs
//
// The fixed six-level hierarchical binning scheme used by the BAM/.bai
// format. Unlike a configurable schema, every level width here is mandated
// by the published format: levels halve in count and multiply span by 8 as
// you go up, bottoming out at a 16 kb leaf window over a 512 Mb reference
// span. These functions are pure and allocate only where a caller needs an
// owned list of candidate bins.

use crate::error::{BaiError, Result};

/// Whole-reference span a level-0 bin can address.
pub const GENOMIC_SPAN: i64 = 1 << 29;

/// Bin number at which each of the six levels begins (root first, leaves last).
pub const LEVEL_STARTS: [u32; 6] = [0, 1, 9, 73, 585, 4681];

/// One past the last bin produced by `reg2bin`/`region_to_bins`.
pub const MAX_BINS: u32 = 37_449;

/// Reserved bin number carrying the two synthetic metadata chunks.
pub const META_BIN: u32 = 37_450;

/// Right-shift (log2 of window size) for each level, root to leaf.
const LEVEL_SHIFTS: [u32; 6] = [29, 26, 23, 20, 17, 14];

/// Compute the bin that a 0-based half-open region `[beg, end)` is assigned to.
pub fn reg2bin(beg: i64, end: i64) -> Result<u32> {
    if end <= beg {
        return Err(BaiError::InvalidRegion { start: beg, end });
    }
    let end = end - 1;
    for &shift in &[14u32, 17, 20, 23, 26] {
        if beg >> shift == end >> shift {
            let offset = (((1i64 << (29 - shift)) - 1) / 7) as u32;
            return Ok(offset + (beg >> shift) as u32);
        }
    }
    Ok(0)
}

/// Compute the level (0 = whole-reference root, 5 = 16 kb leaf) a bin belongs to.
pub fn level_of(bin: u32) -> Result<u32> {
    for level in (0..LEVEL_STARTS.len()).rev() {
        if bin >= LEVEL_STARTS[level] {
            let next_start = LEVEL_STARTS
                .get(level + 1)
                .copied()
                .unwrap_or(MAX_BINS);
            if bin < next_start {
                return Ok(level as u32);
            }
        }
    }
    Err(BaiError::BinOutOfRange(bin))
}

/// 1-based inclusive genomic interval covered by `bin`.
pub fn locus_range_for_bin(bin: u32) -> Result<(i64, i64)> {
    let level = level_of(bin)? as usize;
    let span = 1i64 << LEVEL_SHIFTS[level];
    let index_in_level = (bin - LEVEL_STARTS[level]) as i64;
    let first = index_in_level * span + 1;
    let last = first + span - 1;
    Ok((first, last))
}

pub fn first_locus_in_bin(bin: u32) -> Result<i64> {
    Ok(locus_range_for_bin(bin)?.0)
}

pub fn last_locus_in_bin(bin: u32) -> Result<i64> {
    Ok(locus_range_for_bin(bin)?.1)
}

/// Largest leaf bin number that could be populated for a reference of `len` bases.
pub fn max_bin_for_sequence_length(len: i64) -> u32 {
    LEVEL_STARTS[5] + (len >> 14) as u32
}

/// Normalize a 1-based region into the 0-based half-open coordinates used
/// internally by the binning math. `end <= 0` means "to end of reference".
fn normalize(start_1b: i64, end_1b: i64) -> (i64, i64) {
    let start = (start_1b - 1).max(0) & 0x1FFF_FFFF;
    let end = if end_1b <= 0 {
        0x1FFF_FFFF
    } else {
        (end_1b - 1) & 0x1FFF_FFFF
    };
    (start, end)
}

/// All bins that could contain a record overlapping the 1-based inclusive
/// region `[start_1b, end_1b]`. Always includes bin 0. Returns an empty
/// vector if the normalized region is inverted.
pub fn region_to_bins(start_1b: i64, end_1b: i64) -> Vec<u32> {
    let (start, end) = normalize(start_1b, end_1b);
    if start > end {
        return Vec::new();
    }

    let mut bins = vec![0u32];
    const RANGES: [(u32, u32); 5] = [(1, 26), (9, 23), (73, 20), (585, 17), (4681, 14)];
    for (offset, shift) in RANGES {
        let lo = offset + (start >> shift) as u32;
        let hi = offset + (end >> shift) as u32;
        bins.extend(lo..=hi);
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reg2bin_boundary_cases() {
        assert_eq!(reg2bin(0, 1).unwrap(), 4681);
        assert_eq!(reg2bin(0, 16384).unwrap(), 4681);
        assert_eq!(reg2bin(0, 16385).unwrap(), 585);
    }

    #[test]
    fn reg2bin_rejects_empty_region() {
        assert!(reg2bin(10, 10).is_err());
        assert!(reg2bin(10, 5).is_err());
    }

    #[test]
    fn region_to_bins_first_window() {
        let bins = region_to_bins(1, 16384);
        for expected in [0u32, 1, 9, 73, 585, 4681] {
            assert!(bins.contains(&expected), "missing bin {expected}");
        }
    }

    #[test]
    fn region_to_bins_empty_for_inverted_region() {
        assert!(region_to_bins(100, 1).is_empty());
    }

    #[test]
    fn locus_range_round_trips_leaf_bins() {
        for bin in [4681u32, 4682, 37448] {
            let (first, last) = locus_range_for_bin(bin).unwrap();
            assert_eq!(last - first + 1, 16384);
            let recomputed = reg2bin(first - 1, last).unwrap();
            assert_eq!(recomputed, bin);
        }
    }

    #[test]
    fn level_of_each_level_start() {
        for (level, &start) in LEVEL_STARTS.iter().enumerate() {
            assert_eq!(level_of(start).unwrap(), level as u32);
        }
        assert_eq!(level_of(MAX_BINS - 1).unwrap(), 5);
    }

    proptest! {
        #[test]
        fn reg2bin_always_in_range(beg in 0i64..GENOMIC_SPAN, len in 1i64..1_000_000) {
            let end = (beg + len).min(GENOMIC_SPAN);
            prop_assume!(end > beg);
            let bin = reg2bin(beg, end).unwrap();
            prop_assert!(bin < MAX_BINS);
        }

        #[test]
        fn region_to_bins_contains_the_exact_bin(beg in 0i64..GENOMIC_SPAN, len in 1i64..1_000_000) {
            let end = (beg + len).min(GENOMIC_SPAN);
            prop_assume!(end > beg);
            let exact = reg2bin(beg, end).unwrap();
            let candidates = region_to_bins(beg + 1, end);
            prop_assert!(candidates.contains(&exact));
        }
    }
}
