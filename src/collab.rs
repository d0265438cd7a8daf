// collab.rs
//
// The core never encodes or decodes BGZF blocks or BAM alignment records
// itself. These traits are the seam a caller's record codec and BGZF
// stream implement so the builder and query engine can stay ignorant of
// both.

use crate::chunk::Chunk;

/// What the builder needs from a decoded alignment record. Implemented by
/// the caller's BAM record type; the core only ever reads through this
/// trait.
pub trait IndexableRecord {
    /// `-1` means "no reference" (unmapped, no RNAME).
    fn reference_index(&self) -> i32;

    /// 1-based inclusive alignment start. `0` means unmapped/no-coordinate.
    fn alignment_start(&self) -> i32;

    /// 1-based inclusive alignment end. `0` if unknown (e.g. zero-length).
    fn alignment_end(&self) -> i32;

    fn is_unmapped(&self) -> bool;

    /// Pre-computed bin, if the codec already derived one (common: BAM
    /// stores it in the record itself). `None` falls back to `reg2bin`.
    fn indexing_bin(&self) -> Option<u32>;

    /// The exact byte span this record occupies in the BGZF-compressed BAM,
    /// supplied by the writer that is producing both the BAM and this index.
    fn file_span(&self) -> Option<Chunk>;
}

/// What the builder/reader need from a BGZF-backed stream: the ability to
/// translate between stream position and virtual offset, and to tell
/// whether two offsets are cheap to seek between.
pub trait VirtualPositionSource {
    fn current_virtual_offset(&self) -> crate::voffset::VirtualOffset;
}
