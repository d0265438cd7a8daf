// writer.rs
//
// Serializes a sequence of per-reference index contents to the exact `.bai`
// binary layout: magic, `n_ref`, then for each reference a bin array
// (ascending bin number) and a linear index, little-endian throughout.
// Byte order is explicit (via `byteorder`) rather than derived, because the
// format is an external wire contract this crate does not own.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::error::Result;
use crate::reference::ReferenceIndexContent;

pub const MAGIC: &[u8; 4] = b"BAI\x01";

/// Write the complete `.bai` byte stream for `references` to `out`.
/// `no_coordinate_count`, if present, is written as the optional trailer.
pub fn write_index<W: Write>(
    out: &mut W,
    references: &[ReferenceIndexContent],
    no_coordinate_count: Option<u64>,
) -> Result<()> {
    out.write_all(MAGIC)?;
    out.write_u32::<LittleEndian>(references.len() as u32)?;

    for (ref_index, content) in references.iter().enumerate() {
        write_reference(out, content)?;
        debug!(ref_index, bins = content.bin_count(), "wrote reference block");
    }

    if let Some(count) = no_coordinate_count {
        out.write_u64::<LittleEndian>(count)?;
    }

    Ok(())
}

fn write_reference<W: Write>(out: &mut W, content: &ReferenceIndexContent) -> Result<()> {
    let meta_bin = content.bin(crate::binning::META_BIN);
    let regular_bins = content.bins_ascending();
    let n_bin = regular_bins.len() + meta_bin.is_some() as usize;

    out.write_u32::<LittleEndian>(n_bin as u32)?;
    for bin in &regular_bins {
        write_bin(out, bin.bin_number, &bin.chunks)?;
    }
    if let Some(meta) = meta_bin {
        write_bin(out, meta.bin_number, &meta.chunks)?;
    }

    let entries = content.linear_index.entries();
    out.write_u32::<LittleEndian>(entries.len() as u32)?;
    for offset in entries {
        out.write_u64::<LittleEndian>(offset.as_u64())?;
    }

    Ok(())
}

fn write_bin<W: Write>(out: &mut W, bin_number: u32, chunks: &[crate::chunk::Chunk]) -> Result<()> {
    out.write_u32::<LittleEndian>(bin_number)?;
    out.write_u32::<LittleEndian>(chunks.len() as u32)?;
    for chunk in chunks {
        out.write_u64::<LittleEndian>(chunk.begin.as_u64())?;
        out.write_u64::<LittleEndian>(chunk.end.as_u64())?;
    }
    Ok(())
}

/// Convenience wrapper producing the serialized bytes in memory, useful for
/// tests and small indexes.
pub fn write_index_to_vec(
    references: &[ReferenceIndexContent],
    no_coordinate_count: Option<u64>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_index(&mut buf, references, no_coordinate_count)?;
    Ok(buf)
}
