// builder.rs
//
// Streaming, single-pass construction of a `.bai` index from a stream of
// coordinate-sorted alignment records. One `IndexBuilder` accumulates the
// content for the reference currently "open"; when the reference changes it
// seals that content and moves on. Mirrors the accumulator shape of a
// typical single-pass index builder: no buffering of more than one
// reference's bins at a time.

use tracing::{debug, warn};

use crate::binning::{reg2bin, META_BIN};
use crate::chunk::Chunk;
use crate::collab::IndexableRecord;
use crate::error::{BaiError, Result};
use crate::linear_index::window_of;
use crate::reference::{Metadata, ReferenceIndexContent};

pub struct IndexBuilder {
    n_ref: usize,
    sealed: Vec<ReferenceIndexContent>,
    current_reference: i32,
    current_content: ReferenceIndexContent,
    current_metadata: Metadata,
    largest_window_seen: Option<usize>,
    last_alignment_start: i32,
    no_coordinate_count: u64,
    saw_any_record_for_current: bool,
}

impl IndexBuilder {
    /// `n_ref` is the size of the reference dictionary; references that
    /// never receive a record are sealed as empty content in `finish`.
    pub fn new(n_ref: usize) -> Self {
        Self {
            n_ref,
            sealed: Vec::with_capacity(n_ref),
            current_reference: -1,
            current_content: ReferenceIndexContent::empty(),
            current_metadata: Metadata::empty(),
            largest_window_seen: None,
            last_alignment_start: 0,
            no_coordinate_count: 0,
            saw_any_record_for_current: false,
        }
    }

    pub fn add_record<R: IndexableRecord>(&mut self, record: &R) -> Result<()> {
        let start = record.alignment_start();
        if start == 0 {
            self.no_coordinate_count += 1;
            return Ok(());
        }

        let reference_index = record.reference_index();
        if reference_index != self.current_reference {
            // A reference of -1 ("no reference") is exempt from the ordering
            // check: it never regresses a real reference's sort order.
            if reference_index >= 0 && reference_index < self.current_reference {
                return Err(BaiError::NotCoordinateSorted {
                    reference_index,
                    previous: self.current_reference,
                    current: reference_index,
                });
            }
            self.seal_current();
            debug!(reference_index, "opened new reference");
            self.current_reference = reference_index;
        } else if self.saw_any_record_for_current && start < self.last_alignment_start {
            return Err(BaiError::NotCoordinateSorted {
                reference_index,
                previous: self.last_alignment_start,
                current: start,
            });
        }
        self.last_alignment_start = start;
        self.saw_any_record_for_current = true;

        if record.is_unmapped() {
            self.current_metadata.unaligned_record_count += 1;
        } else {
            self.current_metadata.aligned_record_count += 1;
        }

        let chunk = record
            .file_span()
            .ok_or(BaiError::MissingFileSource { reference_index })?;

        let end = record.alignment_end();
        let bin_number = match record.indexing_bin() {
            Some(bin) => bin,
            None => reg2bin((start - 1) as i64, end.max(start) as i64)?,
        };

        self.update_bin(bin_number, chunk);
        self.update_metadata(chunk);
        self.update_linear_index(start, end, chunk);

        Ok(())
    }

    fn update_bin(&mut self, bin_number: u32, chunk: Chunk) {
        let bin = self.current_content.bin_mut(bin_number);
        match bin.chunks.last_mut() {
            Some(last) if last.is_adjacent_to(&chunk) => {
                if chunk.end > last.end {
                    last.end = chunk.end;
                }
            }
            _ => bin.chunks.push(chunk),
        }
    }

    fn update_metadata(&mut self, chunk: Chunk) {
        if self.current_metadata.first_offset == crate::voffset::VirtualOffset::MIN
            || chunk.begin < self.current_metadata.first_offset
        {
            self.current_metadata.first_offset = chunk.begin;
        }
        if chunk.end > self.current_metadata.last_offset {
            self.current_metadata.last_offset = chunk.end;
        }
    }

    fn update_linear_index(&mut self, start: i32, end: i32, chunk: Chunk) {
        let w_start = if end == 0 {
            window_of((start - 1).max(0) as i64)
        } else {
            window_of(start as i64)
        };
        let w_end = if end == 0 {
            w_start
        } else {
            window_of(end as i64)
        };
        self.largest_window_seen = Some(
            self.largest_window_seen
                .map_or(w_end, |prev| prev.max(w_end)),
        );
        for w in w_start..=w_end {
            self.current_content.linear_index.update(w, chunk.begin);
        }
    }

    /// Freeze the currently open reference, appending its meta bin and
    /// trimming/gap-filling its linear index, then push it onto `sealed`.
    fn seal_current(&mut self) {
        if self.current_reference < 0 {
            return;
        }
        if self.saw_any_record_for_current {
            let meta_chunks = self.current_metadata.to_chunks();
            let meta_bin = crate::reference::Bin {
                bin_number: META_BIN,
                chunks: meta_chunks.to_vec(),
            };
            self.current_content.insert_bin(meta_bin);
            self.current_content.linear_index.fill_gaps();
            self.current_content.metadata = Some(self.current_metadata);
        }

        let target = self.current_reference as usize;
        while self.sealed.len() < target {
            self.sealed.push(ReferenceIndexContent::empty());
        }
        self.sealed
            .push(std::mem::take(&mut self.current_content));

        self.current_metadata = Metadata::empty();
        self.largest_window_seen = None;
        self.saw_any_record_for_current = false;
        self.last_alignment_start = 0;
    }

    /// Seal the last open reference, pad out any trailing references that
    /// never received a record, and return the per-reference contents
    /// alongside the count of records with no coordinate at all.
    pub fn finish(mut self) -> (Vec<ReferenceIndexContent>, u64) {
        self.seal_current();
        while self.sealed.len() < self.n_ref {
            self.sealed.push(ReferenceIndexContent::empty());
        }
        if self.no_coordinate_count > 0 {
            debug!(count = self.no_coordinate_count, "records with no coordinate");
        }
        if self.sealed.len() > self.n_ref {
            warn!(
                observed = self.sealed.len(),
                declared = self.n_ref,
                "more references observed than declared in dictionary"
            );
        }
        (self.sealed, self.no_coordinate_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voffset::VirtualOffset;

    struct FakeRecord {
        reference_index: i32,
        start: i32,
        end: i32,
        unmapped: bool,
        span: Option<Chunk>,
    }

    impl IndexableRecord for FakeRecord {
        fn reference_index(&self) -> i32 {
            self.reference_index
        }
        fn alignment_start(&self) -> i32 {
            self.start
        }
        fn alignment_end(&self) -> i32 {
            self.end
        }
        fn is_unmapped(&self) -> bool {
            self.unmapped
        }
        fn indexing_bin(&self) -> Option<u32> {
            None
        }
        fn file_span(&self) -> Option<Chunk> {
            self.span
        }
    }

    fn aligned(reference_index: i32, start: i32, end: i32, chunk: Chunk) -> FakeRecord {
        FakeRecord {
            reference_index,
            start,
            end,
            unmapped: false,
            span: Some(chunk),
        }
    }

    #[test]
    fn empty_stream_seals_all_references_as_empty() {
        let builder = IndexBuilder::new(3);
        let (refs, no_coord) = builder.finish();
        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|r| r.is_empty()));
        assert_eq!(no_coord, 0);
    }

    #[test]
    fn single_record_populates_leaf_and_meta_bin() {
        let mut builder = IndexBuilder::new(1);
        let chunk = Chunk::new(VirtualOffset::new(0x10000, 0), VirtualOffset::new(0x10100, 0));
        builder.add_record(&aligned(0, 1, 100, chunk)).unwrap();
        let (refs, _) = builder.finish();
        let content = &refs[0];
        assert_eq!(content.bin_count(), 2);
        let leaf_bin = reg2bin(0, 100).unwrap();
        assert!(content.bin(leaf_bin).is_some());
        let meta = content.metadata.unwrap();
        assert_eq!(meta.aligned_record_count, 1);
        assert_eq!(meta.unaligned_record_count, 0);
        assert_eq!(meta.first_offset, chunk.begin);
        assert_eq!(meta.last_offset, chunk.end);
    }

    #[test]
    fn no_coordinate_record_increments_counter_without_touching_bins() {
        let mut builder = IndexBuilder::new(1);
        let rec = FakeRecord {
            reference_index: -1,
            start: 0,
            end: 0,
            unmapped: true,
            span: None,
        };
        builder.add_record(&rec).unwrap();
        let (refs, no_coord) = builder.finish();
        assert_eq!(no_coord, 1);
        assert!(refs[0].is_empty());
    }

    #[test]
    fn out_of_order_start_is_rejected() {
        let mut builder = IndexBuilder::new(1);
        let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 10));
        builder.add_record(&aligned(0, 100, 200, chunk)).unwrap();
        let err = builder.add_record(&aligned(0, 50, 60, chunk)).unwrap_err();
        assert!(matches!(err, BaiError::NotCoordinateSorted { .. }));
    }

    #[test]
    fn reference_out_of_order_is_rejected() {
        let mut builder = IndexBuilder::new(2);
        let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 10));
        builder.add_record(&aligned(1, 10, 20, chunk)).unwrap();
        let err = builder.add_record(&aligned(0, 10, 20, chunk)).unwrap_err();
        assert!(matches!(err, BaiError::NotCoordinateSorted { .. }));
    }

    #[test]
    fn no_reference_record_does_not_trip_the_ordering_check() {
        let mut builder = IndexBuilder::new(2);
        let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 10));
        builder.add_record(&aligned(1, 10, 20, chunk)).unwrap();
        // A record with no reference but a (unusual) non-zero start must not
        // be rejected as a reference regression.
        builder.add_record(&aligned(-1, 5, 15, chunk)).unwrap();
    }

    #[test]
    fn missing_file_source_is_rejected() {
        let mut builder = IndexBuilder::new(1);
        let rec = FakeRecord {
            reference_index: 0,
            start: 10,
            end: 20,
            unmapped: false,
            span: None,
        };
        let err = builder.add_record(&rec).unwrap_err();
        assert!(matches!(err, BaiError::MissingFileSource { .. }));
    }

    #[test]
    fn trailing_references_with_no_records_are_sealed_empty() {
        let mut builder = IndexBuilder::new(3);
        let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 10));
        builder.add_record(&aligned(0, 1, 10, chunk)).unwrap();
        let (refs, _) = builder.finish();
        assert!(!refs[0].is_empty());
        assert!(refs[1].is_empty());
        assert!(refs[2].is_empty());
    }
}
