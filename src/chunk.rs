// chunk.rs
//
// A chunk is a half-open interval of virtual offsets: the byte span in the
// BAM file that a bin's records occupy. Chunk lists are sorted and coalesced
// both incrementally at build time (one adjacency check per record, see
// `builder.rs`) and exhaustively at query time (`optimize`, below).

use crate::voffset::{adjacent, VirtualOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Chunk {
    pub begin: VirtualOffset,
    pub end: VirtualOffset,
}

impl Chunk {
    pub fn new(begin: VirtualOffset, end: VirtualOffset) -> Self {
        Self { begin, end }
    }

    pub fn overlaps(&self, other: &Chunk) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    pub fn is_adjacent_to(&self, next: &Chunk) -> bool {
        adjacent(self.end, next.begin)
    }
}

/// Sort, drop anything wholly below `min_offset`, then coalesce chunks that
/// overlap or sit in the same/neighbouring BGZF block. `min_offset` is
/// normally the linear index's minimum offset for the query's start position.
pub fn optimize(mut chunks: Vec<Chunk>, min_offset: VirtualOffset) -> Vec<Chunk> {
    chunks.retain(|c| c.end > min_offset);
    chunks.sort();

    let mut result: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match result.last_mut() {
            Some(last) if last.is_adjacent_to(&chunk) || last.overlaps(&chunk) => {
                if chunk.end > last.end {
                    last.end = chunk.end;
                }
            }
            _ => result.push(chunk),
        }
    }
    result
}
