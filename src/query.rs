// query.rs
//
// Turns a (reference, start, end) region into the minimal list of chunks a
// caller must scan in the BAM. Candidate bins come from the binning math;
// their chunk lists are unioned, pruned by the linear index, and coalesced.

use crate::binning::{level_of, region_to_bins, LEVEL_STARTS};
use crate::chunk::{optimize, Chunk};
use crate::error::Result;
use crate::reader::BaiReader;
use crate::voffset::VirtualOffset;

/// An ordered, non-overlapping, block-separated list of chunks to scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpan {
    chunks: Vec<Chunk>,
}

impl FileSpan {
    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn first_offset(&self) -> Option<VirtualOffset> {
        self.chunks.first().map(|c| c.begin)
    }

    /// A span covering everything after this one's last chunk, useful for
    /// resuming a scan.
    pub fn contents_following(&self) -> Option<VirtualOffset> {
        self.chunks.last().map(|c| c.end)
    }
}

/// Query reference `reference_index` over the 1-based inclusive region
/// `[start_1b, end_1b]`. `end_1b <= 0` means "to end of reference". Returns
/// an empty span (not an error) for an out-of-range reference or an
/// inverted region.
pub fn query(
    reader: &BaiReader,
    reference_index: i32,
    start_1b: i64,
    end_1b: i64,
) -> Result<FileSpan> {
    if reference_index < 0 || reference_index as usize >= reader.n_ref() {
        return Ok(FileSpan::empty());
    }

    let candidate_bins = region_to_bins(start_1b, end_1b);
    if candidate_bins.is_empty() {
        return Ok(FileSpan::empty());
    }

    let content = reader.reference(reference_index as usize)?;
    if content.is_empty() {
        return Ok(FileSpan::empty());
    }

    let chunks = content.collect_chunks(&candidate_bins);
    if chunks.is_empty() {
        return Ok(FileSpan::empty());
    }

    let min_offset = content.linear_index.min_offset(start_1b);
    let optimized = optimize(chunks, min_offset);

    Ok(FileSpan { chunks: optimized })
}

/// Chunks for one specific bin plus every ancestor bin that covers it —
/// useful for a parallel scan split at bin granularity.
pub fn span_for_bin(reader: &BaiReader, reference_index: i32, bin: u32) -> Result<FileSpan> {
    if reference_index < 0 || reference_index as usize >= reader.n_ref() {
        return Ok(FileSpan::empty());
    }
    let content = reader.reference(reference_index as usize)?;
    if content.is_empty() {
        return Ok(FileSpan::empty());
    }

    const LEVEL_SHIFTS: [u32; 6] = [29, 26, 23, 20, 17, 14];
    let mut bins = vec![bin];
    let level = level_of(bin)?;
    let (first, _) = crate::binning::locus_range_for_bin(bin)?;
    let pos0 = (first - 1) as i64;
    for ancestor_level in 0..level {
        let shift = LEVEL_SHIFTS[ancestor_level as usize];
        let ancestor = LEVEL_STARTS[ancestor_level as usize] + (pos0 >> shift) as u32;
        bins.push(ancestor);
    }

    let chunks = content.collect_chunks(&bins);
    if chunks.is_empty() {
        return Ok(FileSpan::empty());
    }
    Ok(FileSpan {
        chunks: optimize(chunks, VirtualOffset::MIN),
    })
}
