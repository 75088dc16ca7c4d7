//! Position index built from the chunk scanner
//!
//! The buffer is walked in [`CHUNK_WIDTH`]-byte steps; every set bit of each
//! mask becomes an absolute offset in the sequence of its delimiter class.
//! Bits are taken lowest first, so each sequence comes out sorted and no
//! merge sort is needed afterwards. Bytes past the last full chunk are
//! examined one at a time.

use std::iter::FusedIterator;
use std::ops::Range;

use log::{debug, warn};

use crate::error::Error;
use crate::portability::SetBits;
use crate::scanner::{scan_scalar, Backend, Chunk, ChunkMasks, Delimiter, CHUNK_WIDTH};

#[cfg(target_arch = "aarch64")]
use crate::scanner::scan_neon;
#[cfg(target_arch = "x86_64")]
use crate::scanner::scan_avx2;

/// Largest buffer whose offsets fit the `u32` position representation
pub const MAX_BUFFER_LEN: usize = u32::MAX as usize;

/// Offset of a delimiter byte tagged with its class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelimiterPosition {
    pub offset: u32,
    pub kind: Delimiter,
}

/// Ascending offsets of every comma, newline and quote in a buffer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionIndex {
    commas: Vec<u32>,
    newlines: Vec<u32>,
    quotes: Vec<u32>,
    len: usize,
}

impl PositionIndex {
    /// Create an empty index with capacity estimated from the buffer length
    fn with_capacity(len: usize) -> Self {
        Self {
            commas: Vec::with_capacity(len / 8),
            newlines: Vec::with_capacity(len / 128),
            quotes: Vec::new(),
            len,
        }
    }

    /// Index `buf` using the widest backend this CPU supports
    pub fn build(buf: &[u8]) -> Result<Self, Error> {
        Self::build_with(buf, Backend::detect())
    }

    /// Index `buf` using a specific backend
    ///
    /// An unavailable backend is replaced by the detected one.
    pub fn build_with(buf: &[u8], backend: Backend) -> Result<Self, Error> {
        check_len(buf.len())?;

        let backend = if backend.is_available() {
            backend
        } else {
            let detected = Backend::detect();
            warn!(
                "{} backend unavailable on this CPU, using {}",
                backend.name(),
                detected.name()
            );
            detected
        };

        let mut index = Self::with_capacity(buf.len());
        let tail = match backend {
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => {
                // SAFETY: availability was checked above
                unsafe { index.index_chunks_avx2(buf) }
            }
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => index.index_chunks(buf, scan_neon),
            _ => index.index_chunks(buf, scan_scalar),
        };
        index.index_tail(buf, tail);

        debug!(
            "indexed {} bytes with {}: {} commas, {} newlines, {} quotes",
            buf.len(),
            backend.name(),
            index.commas.len(),
            index.newlines.len(),
            index.quotes.len()
        );
        Ok(index)
    }

    /// Scan every full chunk, returning the offset where the tail starts
    #[inline(always)]
    fn index_chunks(&mut self, buf: &[u8], scan: impl Fn(&Chunk) -> ChunkMasks) -> usize {
        for (base, chunk) in full_chunks(buf) {
            self.record(scan(chunk), base);
        }
        tail_start(buf.len())
    }

    #[cfg(target_arch = "x86_64")]
    #[target_feature(enable = "avx2")]
    unsafe fn index_chunks_avx2(&mut self, buf: &[u8]) -> usize {
        for (base, chunk) in full_chunks(buf) {
            self.record(scan_avx2(chunk), base);
        }
        tail_start(buf.len())
    }

    /// Append the absolute offsets of every set bit in `masks`
    #[inline(always)]
    fn record(&mut self, masks: ChunkMasks, base: u32) {
        flatten_bits(&mut self.commas, base, masks.comma);
        flatten_bits(&mut self.newlines, base, masks.newline);
        flatten_bits(&mut self.quotes, base, masks.quote);
    }

    /// Byte-wise pass over whatever did not fill a full chunk
    fn index_tail(&mut self, buf: &[u8], start: usize) {
        for (offset, &byte) in buf.iter().enumerate().skip(start) {
            let offset = offset as u32;
            match Delimiter::from_byte(byte) {
                Some(Delimiter::Comma) => self.commas.push(offset),
                Some(Delimiter::Newline) => self.newlines.push(offset),
                Some(Delimiter::Quote) => self.quotes.push(offset),
                None => {}
            }
        }
    }

    /// Length of the buffer this index was built from
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ascending offsets of one delimiter class
    #[inline]
    pub fn offsets(&self, kind: Delimiter) -> &[u32] {
        match kind {
            Delimiter::Comma => &self.commas,
            Delimiter::Newline => &self.newlines,
            Delimiter::Quote => &self.quotes,
        }
    }

    #[inline]
    pub fn commas(&self) -> &[u32] {
        &self.commas
    }

    #[inline]
    pub fn newlines(&self) -> &[u32] {
        &self.newlines
    }

    #[inline]
    pub fn quotes(&self) -> &[u32] {
        &self.quotes
    }

    #[inline]
    pub fn count(&self, kind: Delimiter) -> usize {
        self.offsets(kind).len()
    }

    /// Commas with `range.start <= offset < range.end`
    #[inline]
    pub fn commas_in(&self, range: Range<usize>) -> &[u32] {
        let lo = self.commas.partition_point(|&c| (c as usize) < range.start);
        let hi = lo + self.commas[lo..].partition_point(|&c| (c as usize) < range.end);
        &self.commas[lo..hi]
    }

    /// Every position of every class in ascending offset order
    pub fn positions(&self) -> Positions<'_> {
        Positions {
            commas: &self.commas,
            newlines: &self.newlines,
            quotes: &self.quotes,
        }
    }
}

/// Reject buffers whose offsets would not fit in a `u32`
#[inline]
fn check_len(len: usize) -> Result<(), Error> {
    if len > MAX_BUFFER_LEN {
        return Err(Error::BufferTooLarge {
            len,
            max: MAX_BUFFER_LEN,
        });
    }
    Ok(())
}

/// Full chunks of `buf` paired with their starting offset
#[inline(always)]
fn full_chunks(buf: &[u8]) -> impl Iterator<Item = (u32, &Chunk)> + '_ {
    buf.chunks_exact(CHUNK_WIDTH)
        .filter_map(|chunk| <&Chunk>::try_from(chunk).ok())
        .enumerate()
        .map(|(i, chunk)| ((i * CHUNK_WIDTH) as u32, chunk))
}

/// First offset not covered by a full chunk
#[inline(always)]
fn tail_start(len: usize) -> usize {
    len - len % CHUNK_WIDTH
}

/// Push `idx + bit` for every set bit of `bits`, lowest bit first
#[inline(always)]
fn flatten_bits(out: &mut Vec<u32>, idx: u32, bits: u32) {
    if bits == 0 {
        return;
    }
    out.extend(SetBits::new(bits).map(|bit| idx + bit));
}

/// Merged walk over the three sorted position sequences
#[derive(Clone, Debug)]
pub struct Positions<'i> {
    commas: &'i [u32],
    newlines: &'i [u32],
    quotes: &'i [u32],
}

impl<'i> Positions<'i> {
    fn head(&self, kind: Delimiter) -> Option<u32> {
        match kind {
            Delimiter::Comma => self.commas.first().copied(),
            Delimiter::Newline => self.newlines.first().copied(),
            Delimiter::Quote => self.quotes.first().copied(),
        }
    }

    fn advance(&mut self, kind: Delimiter) {
        let seq = match kind {
            Delimiter::Comma => &mut self.commas,
            Delimiter::Newline => &mut self.newlines,
            Delimiter::Quote => &mut self.quotes,
        };
        let rest: &'i [u32] = *seq;
        *seq = &rest[1..];
    }
}

impl Iterator for Positions<'_> {
    type Item = DelimiterPosition;

    fn next(&mut self) -> Option<DelimiterPosition> {
        // a byte belongs to at most one class, so offsets never tie
        let (offset, kind) = Delimiter::ALL
            .iter()
            .filter_map(|&kind| self.head(kind).map(|offset| (offset, kind)))
            .min_by_key(|&(offset, _)| offset)?;
        self.advance(kind);
        Some(DelimiterPosition { offset, kind })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.commas.len() + self.newlines.len() + self.quotes.len();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Positions<'_> {}
impl FusedIterator for Positions<'_> {}
