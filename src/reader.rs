// reader.rs
//
// Random-access parse of a `.bai` file. There is no offset table in the
// format, so opening the reader performs one lightweight skip-scan to learn
// where each reference's byte block starts; actual bin/chunk/linear-index
// decoding happens lazily per reference and is cached, since query engines
// tend to revisit the same reference repeatedly.

use std::collections::VecDeque;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::binning::META_BIN;
use crate::chunk::Chunk;
use crate::error::{BaiError, Result};
use crate::linear_index::LinearIndex;
use crate::reference::{Bin, Metadata, ReferenceIndexContent};
use crate::voffset::VirtualOffset;
use crate::writer::MAGIC;

/// How aggressively the reader retains decoded per-reference content
/// between queries.
#[derive(Debug, Clone, Copy)]
pub enum CachePolicy {
    /// Decode on every access; never retain.
    NoCache,
    /// Retain up to `n` most recently used references.
    Lru(NonZeroUsize),
    /// Decode and retain every reference the first time any of them is touched.
    FullEager,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Lru(NonZeroUsize::new(8).unwrap())
    }
}

/// A random-access `.bai` reader. Cheap to clone and safe to move across
/// threads: the memory map and the byte offsets of each reference block are
/// shared via `Arc`; each clone gets its own decode cache so concurrent
/// callers never contend on one another's.
pub struct BaiReader {
    mmap: Arc<Mmap>,
    ref_offsets: Arc<Vec<usize>>,
    no_coordinate_count: Option<u64>,
    policy: CachePolicy,
    cache: Mutex<FxHashMap<usize, Arc<ReferenceIndexContent>>>,
    lru_order: Mutex<VecDeque<usize>>,
    closed: AtomicBool,
}

impl Clone for BaiReader {
    fn clone(&self) -> Self {
        Self {
            mmap: self.mmap.clone(),
            ref_offsets: self.ref_offsets.clone(),
            no_coordinate_count: self.no_coordinate_count,
            policy: self.policy,
            cache: Mutex::new(FxHashMap::default()),
            lru_order: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 4 > buf.len() {
        return Err(BaiError::Truncated {
            expected: 4,
            found: buf.len().saturating_sub(*pos),
        });
    }
    let v = LittleEndian::read_u32(&buf[*pos..*pos + 4]);
    *pos += 4;
    Ok(v)
}

fn read_u64(buf: &[u8], pos: &mut usize) -> Result<u64> {
    if *pos + 8 > buf.len() {
        return Err(BaiError::Truncated {
            expected: 8,
            found: buf.len().saturating_sub(*pos),
        });
    }
    let v = LittleEndian::read_u64(&buf[*pos..*pos + 8]);
    *pos += 8;
    Ok(v)
}

/// Advance past one reference block without allocating, returning the
/// number of bytes consumed.
fn skip_reference(buf: &[u8]) -> Result<usize> {
    let mut pos = 0usize;
    let n_bin = read_u32(buf, &mut pos)?;
    for _ in 0..n_bin {
        let _bin_number = read_u32(buf, &mut pos)?;
        let n_chunk = read_u32(buf, &mut pos)?;
        let bytes = n_chunk as usize * 16;
        if pos + bytes > buf.len() {
            return Err(BaiError::Truncated {
                expected: bytes,
                found: buf.len() - pos,
            });
        }
        pos += bytes;
    }
    let n_intv = read_u32(buf, &mut pos)?;
    let bytes = n_intv as usize * 8;
    if pos + bytes > buf.len() {
        return Err(BaiError::Truncated {
            expected: bytes,
            found: buf.len() - pos,
        });
    }
    pos += bytes;
    Ok(pos)
}

fn decode_reference(buf: &[u8]) -> Result<ReferenceIndexContent> {
    let mut pos = 0usize;
    let n_bin = read_u32(buf, &mut pos)?;
    let mut content = ReferenceIndexContent::empty();
    for _ in 0..n_bin {
        let bin_number = read_u32(buf, &mut pos)?;
        let n_chunk = read_u32(buf, &mut pos)?;
        let mut chunks = Vec::with_capacity(n_chunk as usize);
        for _ in 0..n_chunk {
            let begin = read_u64(buf, &mut pos)?;
            let end = read_u64(buf, &mut pos)?;
            chunks.push(Chunk::new(VirtualOffset::from(begin), VirtualOffset::from(end)));
        }
        if bin_number == META_BIN {
            content.metadata = Metadata::from_chunks(&chunks);
        }
        content.insert_bin(Bin { bin_number, chunks });
    }
    let n_intv = read_u32(buf, &mut pos)?;
    let mut entries = Vec::with_capacity(n_intv as usize);
    for _ in 0..n_intv {
        entries.push(VirtualOffset::from(read_u64(buf, &mut pos)?));
    }
    content.linear_index = LinearIndex::from_entries(entries);
    Ok(content)
}

impl BaiReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_policy(path, CachePolicy::default())
    }

    pub fn open_with_policy(path: impl AsRef<Path>, policy: CachePolicy) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() < 8 || &mmap[0..4] != MAGIC {
            return Err(BaiError::InvalidMagic);
        }
        let n_ref = LittleEndian::read_u32(&mmap[4..8]) as usize;

        let mut ref_offsets = Vec::with_capacity(n_ref + 1);
        let mut pos = 8usize;
        ref_offsets.push(pos);
        for _ in 0..n_ref {
            let consumed = skip_reference(&mmap[pos..])?;
            pos += consumed;
            ref_offsets.push(pos);
        }

        let no_coordinate_count = if mmap.len() >= pos + 8 {
            Some(LittleEndian::read_u64(&mmap[pos..pos + 8]))
        } else {
            None
        };

        debug!(n_ref, "opened .bai index");

        Ok(Self {
            mmap: Arc::new(mmap),
            ref_offsets: Arc::new(ref_offsets),
            no_coordinate_count,
            policy,
            cache: Mutex::new(FxHashMap::default()),
            lru_order: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn n_ref(&self) -> usize {
        self.ref_offsets.len().saturating_sub(1)
    }

    pub fn no_coordinate_count(&self) -> Option<u64> {
        self.no_coordinate_count
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    /// Decoded content for reference `index`, served from cache when policy
    /// allows it.
    pub fn reference(&self, index: usize) -> Result<Arc<ReferenceIndexContent>> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(BaiError::ClosedIndex);
        }
        if index >= self.n_ref() {
            return Err(BaiError::Truncated {
                expected: index + 1,
                found: self.n_ref(),
            });
        }

        if let CachePolicy::NoCache = self.policy {
            trace!(index, "decoding reference (no cache)");
            let start = self.ref_offsets[index];
            let end = self.ref_offsets[index + 1];
            return Ok(Arc::new(decode_reference(&self.mmap[start..end])?));
        }

        if let Some(hit) = self.cache.lock().get(&index) {
            trace!(index, "reference cache hit");
            self.touch(index);
            return Ok(hit.clone());
        }

        trace!(index, "reference cache miss, decoding");
        let start = self.ref_offsets[index];
        let end = self.ref_offsets[index + 1];
        let content = Arc::new(decode_reference(&self.mmap[start..end])?);
        self.insert_cache(index, content.clone());
        Ok(content)
    }

    fn touch(&self, index: usize) {
        if let CachePolicy::Lru(_) = self.policy {
            let mut order = self.lru_order.lock();
            order.retain(|&i| i != index);
            order.push_back(index);
        }
    }

    fn insert_cache(&self, index: usize, content: Arc<ReferenceIndexContent>) {
        self.cache.lock().insert(index, content);
        match self.policy {
            CachePolicy::Lru(max) => {
                let mut order = self.lru_order.lock();
                order.push_back(index);
                while order.len() > max.get() {
                    if let Some(evict) = order.pop_front() {
                        self.cache.lock().remove(&evict);
                    }
                }
            }
            CachePolicy::FullEager | CachePolicy::NoCache => {}
        }
    }

    /// Eagerly decode and cache every reference; only meaningful under
    /// `CachePolicy::FullEager`.
    pub fn warm(&self) -> Result<()> {
        for i in 0..self.n_ref() {
            self.reference(i)?;
        }
        Ok(())
    }

    /// Last linear-index entry of the last reference that has one, used to
    /// seek straight to trailing unmapped records.
    pub fn start_of_last_linear_bin(&self) -> Result<Option<VirtualOffset>> {
        for index in (0..self.n_ref()).rev() {
            let content = self.reference(index)?;
            if let Some(&last) = content.linear_index.entries().last() {
                return Ok(Some(last));
            }
        }
        Ok(None)
    }
}
