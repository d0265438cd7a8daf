//! BAM binning index (`.bai`) construction, serialization, and
//! random-access querying.
//!
//! The crate is organized bottom-up: [`voffset`] and [`binning`] are pure
//! math with no I/O; [`chunk`], [`linear_index`], and [`reference`] build up
//! the per-reference data model; [`builder`] accumulates that model from a
//! coordinate-sorted record stream; [`writer`] and [`reader`] move it to and
//! from the on-disk `.bai` layout; [`query`] turns a region into the chunks
//! a caller should scan. BGZF block I/O and BAM record decoding are not
//! implemented here — see [`collab`] for the trait seams a caller's codec
//! fills in.

pub mod binning;
pub mod builder;
pub mod chunk;
pub mod collab;
pub mod diagnostic;
pub mod error;
pub mod linear_index;
pub mod query;
pub mod reader;
pub mod reference;
pub mod voffset;
pub mod writer;

pub use binning::{reg2bin, region_to_bins};
pub use builder::IndexBuilder;
pub use chunk::Chunk;
pub use collab::IndexableRecord;
pub use error::{BaiError, Result};
pub use query::{query, span_for_bin, FileSpan};
pub use reader::{BaiReader, CachePolicy};
pub use reference::ReferenceIndexContent;
pub use voffset::VirtualOffset;
pub use writer::write_index;

#[cfg(test)]
pub(crate) mod test_utils;
