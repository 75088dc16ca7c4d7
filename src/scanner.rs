//! Vectorized character-class detection over fixed-width chunks
//!
//! A chunk of [`CHUNK_WIDTH`] bytes is loaded once and compared against each
//! delimiter byte, producing one bitmask per delimiter class. AVX2 is used on
//! x86_64 when the CPU supports it, NEON on aarch64, and a byte loop
//! everywhere else.

use crate::portability::{has_avx2, has_neon};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Number of bytes examined per vector step
pub const CHUNK_WIDTH: usize = 32;

/// One fixed-width window of the input buffer
pub type Chunk = [u8; CHUNK_WIDTH];

/// A structurally significant byte
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Delimiter {
    Comma,
    Newline,
    Quote,
}

impl Delimiter {
    pub const ALL: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Newline, Delimiter::Quote];

    /// The byte this delimiter matches
    #[inline(always)]
    pub const fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Newline => b'\n',
            Delimiter::Quote => b'"',
        }
    }

    #[inline(always)]
    pub const fn from_byte(byte: u8) -> Option<Delimiter> {
        match byte {
            b',' => Some(Delimiter::Comma),
            b'\n' => Some(Delimiter::Newline),
            b'"' => Some(Delimiter::Quote),
            _ => None,
        }
    }
}

/// Per-class match masks for one chunk; bit `i` is set iff byte `i` matched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkMasks {
    pub comma: u32,
    pub newline: u32,
    pub quote: u32,
}

impl ChunkMasks {
    #[inline(always)]
    pub fn get(&self, kind: Delimiter) -> u32 {
        match kind {
            Delimiter::Comma => self.comma,
            Delimiter::Newline => self.newline,
            Delimiter::Quote => self.quote,
        }
    }
}

/// Instruction set used to scan full chunks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Scalar,
    Avx2,
    Neon,
}

impl Backend {
    /// Pick the widest backend the running CPU supports
    pub fn detect() -> Backend {
        if has_avx2() {
            Backend::Avx2
        } else if has_neon() {
            Backend::Neon
        } else {
            Backend::Scalar
        }
    }

    /// Every backend usable on this host, scalar first, without duplicates
    pub fn available_backends() -> Vec<Backend> {
        [Backend::Scalar, Backend::Avx2, Backend::Neon]
            .into_iter()
            .filter(|backend| backend.is_available())
            .collect()
    }

    pub fn is_available(self) -> bool {
        match self {
            Backend::Scalar => true,
            Backend::Avx2 => has_avx2(),
            Backend::Neon => has_neon(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }
}

/// Scan one chunk with the backend detected for this host
#[inline]
pub fn scan(chunk: &Chunk) -> ChunkMasks {
    scan_with(Backend::detect(), chunk)
}

/// Scan one chunk with the given backend, falling back to the byte loop
/// if it is not available on this host
#[inline]
pub fn scan_with(backend: Backend, chunk: &Chunk) -> ChunkMasks {
    match backend {
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 if has_avx2() => {
            // SAFETY: AVX2 support was checked above
            unsafe { scan_avx2(chunk) }
        }
        #[cfg(target_arch = "aarch64")]
        Backend::Neon => scan_neon(chunk),
        _ => scan_scalar(chunk),
    }
}

/// Portable byte-at-a-time scan
#[inline]
pub fn scan_scalar(chunk: &Chunk) -> ChunkMasks {
    let mut masks = ChunkMasks::default();
    for (i, &byte) in chunk.iter().enumerate() {
        let bit = 1u32 << i;
        match Delimiter::from_byte(byte) {
            Some(Delimiter::Comma) => masks.comma |= bit,
            Some(Delimiter::Newline) => masks.newline |= bit,
            Some(Delimiter::Quote) => masks.quote |= bit,
            None => {}
        }
    }
    masks
}

/// Compare all 32 lanes against `byte` and pack the result into a mask
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn cmp_mask_avx2(input: __m256i, byte: u8) -> u32 {
    let needle = _mm256_set1_epi8(byte as i8);
    let cmp = _mm256_cmpeq_epi8(input, needle);
    _mm256_movemask_epi8(cmp) as u32
}

/// AVX2 scan: one 256-bit load, three compares
///
/// # Safety
/// The caller must ensure the CPU supports AVX2.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
pub unsafe fn scan_avx2(chunk: &Chunk) -> ChunkMasks {
    let input = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
    ChunkMasks {
        comma: cmp_mask_avx2(input, b','),
        newline: cmp_mask_avx2(input, b'\n'),
        quote: cmp_mask_avx2(input, b'"'),
    }
}

/// Pack the high bit of each lane of a NEON compare result into 16 bits
#[cfg(target_arch = "aarch64")]
#[inline(always)]
unsafe fn neon_movemask(cmp: uint8x16_t) -> u16 {
    const WEIGHTS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];
    let weights = vld1q_u8(WEIGHTS.as_ptr());
    // compare lanes are all-ones or zero, so the AND keeps exactly one weight bit
    let bits = vandq_u8(cmp, weights);
    let lo = vaddv_u8(vget_low_u8(bits)) as u16;
    let hi = vaddv_u8(vget_high_u8(bits)) as u16;
    lo | (hi << 8)
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
unsafe fn cmp_mask_neon(lo: uint8x16_t, hi: uint8x16_t, byte: u8) -> u32 {
    let needle = vdupq_n_u8(byte);
    let lo_mask = neon_movemask(vceqq_u8(lo, needle)) as u32;
    let hi_mask = neon_movemask(vceqq_u8(hi, needle)) as u32;
    lo_mask | (hi_mask << 16)
}

/// NEON scan: two 128-bit loads, three compares per half
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn scan_neon(chunk: &Chunk) -> ChunkMasks {
    // SAFETY: NEON is part of the aarch64 baseline and the chunk holds
    // exactly 32 readable bytes
    unsafe {
        let lo = vld1q_u8(chunk.as_ptr());
        let hi = vld1q_u8(chunk.as_ptr().add(16));
        ChunkMasks {
            comma: cmp_mask_neon(lo, hi, b','),
            newline: cmp_mask_neon(lo, hi, b'\n'),
            quote: cmp_mask_neon(lo, hi, b'"'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_from(text: &[u8], fill: u8) -> Chunk {
        let mut chunk = [fill; CHUNK_WIDTH];
        chunk[..text.len()].copy_from_slice(text);
        chunk
    }

    fn positions(mask: u32) -> Vec<u32> {
        (0..32).filter(|i| mask & (1 << i) != 0).collect()
    }

    #[test]
    fn test_scan_commas() {
        let chunk = chunk_from(b"hello,world,test,data", 0);
        let masks = scan(&chunk);
        assert_eq!(positions(masks.comma), vec![5, 11, 16]);
        assert_eq!(masks.newline, 0);
        assert_eq!(masks.quote, 0);
    }

    #[test]
    fn test_scan_no_matches() {
        let chunk = chunk_from(b"no commas in this string", 0);
        assert_eq!(scan(&chunk), ChunkMasks::default());
    }

    #[test]
    fn test_scan_adjacent_and_edges() {
        let chunk = chunk_from(b",start,,middle,end,", b'x');
        let masks = scan(&chunk);
        assert_eq!(positions(masks.comma), vec![0, 6, 7, 14, 18]);
    }

    #[test]
    fn test_scan_high_lanes() {
        let mut chunk = [b'x'; CHUNK_WIDTH];
        chunk[5] = b',';
        chunk[17] = b'\n';
        chunk[30] = b'"';
        chunk[31] = b',';
        let masks = scan(&chunk);
        assert_eq!(positions(masks.comma), vec![5, 31]);
        assert_eq!(positions(masks.newline), vec![17]);
        assert_eq!(positions(masks.quote), vec![30]);
        assert_eq!(masks.get(Delimiter::Comma), masks.comma);
    }

    #[test]
    fn test_backends_agree() {
        let chunk = chunk_from(b"\"a\",b\nc,,\"d\"\n,e,f\n\"\"\",,,\n,\"x", b'y');
        let expected = scan_scalar(&chunk);
        for backend in [Backend::Scalar, Backend::Avx2, Backend::Neon] {
            assert_eq!(scan_with(backend, &chunk), expected, "{}", backend.name());
        }
    }

    #[test]
    fn test_delimiter_bytes() {
        for kind in Delimiter::ALL {
            assert_eq!(Delimiter::from_byte(kind.byte()), Some(kind));
        }
        assert_eq!(Delimiter::from_byte(b'a'), None);
    }

    #[test]
    fn test_detected_backend_is_available() {
        assert!(Backend::detect().is_available());
        assert!(Backend::Scalar.is_available());
    }

    #[test]
    fn test_available_backends_are_distinct() {
        let backends = Backend::available_backends();
        assert_eq!(backends[0], Backend::Scalar);
        assert!(backends.contains(&Backend::detect()));

        let mut names: Vec<_> = backends.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), backends.len());
    }
}
