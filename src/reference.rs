// reference.rs
//
// The per-reference slice of a `.bai`: a sparse map from bin number to the
// chunks recorded for it, a linear index, and the aligned/unaligned
// metadata ordinarily folded into the synthetic "meta" bin on disk.

use rustc_hash::FxHashMap;

use crate::binning::META_BIN;
use crate::chunk::Chunk;
use crate::linear_index::LinearIndex;
use crate::voffset::VirtualOffset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub bin_number: u32,
    pub chunks: Vec<Chunk>,
}

impl Bin {
    pub fn new(bin_number: u32) -> Self {
        Self {
            bin_number,
            chunks: Vec::new(),
        }
    }
}

/// Counts and file-span extremes tracked per reference; encoded on disk as
/// the two synthetic chunks of the `META_BIN` bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub first_offset: VirtualOffset,
    pub last_offset: VirtualOffset,
    pub aligned_record_count: u64,
    pub unaligned_record_count: u64,
}

impl Metadata {
    pub fn empty() -> Self {
        Self {
            first_offset: VirtualOffset::MIN,
            last_offset: VirtualOffset::MIN,
            aligned_record_count: 0,
            unaligned_record_count: 0,
        }
    }

    /// Decode metadata from the meta bin's two chunks, as read off disk.
    pub fn from_chunks(chunks: &[Chunk]) -> Option<Self> {
        if chunks.len() != 2 {
            return None;
        }
        Some(Self {
            first_offset: chunks[0].begin,
            last_offset: chunks[0].end,
            aligned_record_count: chunks[1].begin.as_u64(),
            unaligned_record_count: chunks[1].end.as_u64(),
        })
    }

    /// Encode as the two chunks the binary format expects under `META_BIN`.
    pub fn to_chunks(self) -> [Chunk; 2] {
        [
            Chunk::new(self.first_offset, self.last_offset),
            Chunk::new(
                VirtualOffset::from(self.aligned_record_count),
                VirtualOffset::from(self.unaligned_record_count),
            ),
        ]
    }
}

/// Fully decoded index content for a single reference sequence. `None`
/// content (the common case for a reference dictionary entry that received
/// no records) is represented by `ReferenceIndexContent::empty()`, not by an
/// `Option` wrapper, so callers don't need to special-case it.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndexContent {
    bins: FxHashMap<u32, Bin>,
    pub linear_index: LinearIndex,
    pub metadata: Option<Metadata>,
}

impl ReferenceIndexContent {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty() && self.linear_index.is_empty()
    }

    pub fn bin_mut(&mut self, bin_number: u32) -> &mut Bin {
        self.bins
            .entry(bin_number)
            .or_insert_with(|| Bin::new(bin_number))
    }

    pub fn bin(&self, bin_number: u32) -> Option<&Bin> {
        self.bins.get(&bin_number)
    }

    pub fn insert_bin(&mut self, bin: Bin) {
        self.bins.insert(bin.bin_number, bin);
    }

    /// Populated, non-meta bins, in ascending bin-number order — the order
    /// the binary format requires.
    pub fn bins_ascending(&self) -> Vec<&Bin> {
        let mut bins: Vec<&Bin> = self
            .bins
            .values()
            .filter(|b| b.bin_number != META_BIN)
            .collect();
        bins.sort_by_key(|b| b.bin_number);
        bins
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Chunks belonging to any of `candidate_bins` that are present in this
    /// reference's content.
    pub fn collect_chunks(&self, candidate_bins: &[u32]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for &bin_number in candidate_bins {
            if let Some(bin) = self.bins.get(&bin_number) {
                chunks.extend_from_slice(&bin.chunks);
            }
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips_through_chunks() {
        let meta = Metadata {
            first_offset: VirtualOffset::new(10, 0),
            last_offset: VirtualOffset::new(200, 5),
            aligned_record_count: 42,
            unaligned_record_count: 3,
        };
        let chunks = meta.to_chunks();
        let decoded = Metadata::from_chunks(&chunks).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn bins_ascending_excludes_meta_bin_and_sorts() {
        let mut content = ReferenceIndexContent::empty();
        content.bin_mut(500);
        content.bin_mut(10);
        content.bin_mut(META_BIN);
        let bins = content.bins_ascending();
        assert_eq!(bins.len(), 2);
        assert!(bins[0].bin_number < bins[1].bin_number);
    }

    #[test]
    fn empty_content_has_no_bins_or_linear_entries() {
        assert!(ReferenceIndexContent::empty().is_empty());
    }
}
