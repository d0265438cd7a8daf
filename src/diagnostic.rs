// diagnostic.rs
//
// Human-readable dump of a decoded index, mirroring the binary layout line
// for line. Not a published format; used for test diffing and ad hoc
// inspection of a built index.

use std::fmt::Write as _;

use crate::reference::ReferenceIndexContent;

pub fn format_index(references: &[ReferenceIndexContent], no_coordinate_count: Option<u64>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "n_ref={}", references.len());
    for (ref_index, content) in references.iter().enumerate() {
        let _ = writeln!(out, "reference {ref_index}:");
        for bin in content.bins_ascending() {
            let _ = writeln!(out, "  bin {} n_chunk={}", bin.bin_number, bin.chunks.len());
            for chunk in &bin.chunks {
                let _ = writeln!(out, "    chunk {} {}", chunk.begin, chunk.end);
            }
        }
        if let Some(meta) = content.metadata {
            let _ = writeln!(
                out,
                "  meta aligned={} unaligned={} span=[{},{})",
                meta.aligned_record_count, meta.unaligned_record_count, meta.first_offset, meta.last_offset
            );
        }
        let _ = writeln!(out, "  n_intv={}", content.linear_index.len());
    }
    if let Some(count) = no_coordinate_count {
        let _ = writeln!(out, "no_coordinate_count={count}");
    }
    out
}
