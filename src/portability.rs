//! Portability utilities for bit operations and CPU feature detection

/// Count trailing zeros in a 32-bit mask
#[inline(always)]
pub fn trailing_zeros(x: u32) -> u32 {
    x.trailing_zeros()
}

/// Count number of set bits (Hamming weight/popcount)
#[inline(always)]
pub fn hamming(x: u32) -> u32 {
    x.count_ones()
}

/// Iterator over the set bit positions of a chunk mask, lowest first
///
/// Each step takes the lowest set bit and clears it, so positions come out
/// in ascending order.
#[derive(Clone, Copy, Debug)]
pub struct SetBits(u32);

impl SetBits {
    #[inline(always)]
    pub fn new(mask: u32) -> Self {
        Self(mask)
    }
}

impl Iterator for SetBits {
    type Item = u32;

    #[inline(always)]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = trailing_zeros(self.0);
        self.0 &= self.0 - 1;
        Some(bit)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = hamming(self.0) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SetBits {}

/// Whether AVX2 can be used on this host
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn has_avx2() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub fn has_avx2() -> bool {
    false
}

/// Whether NEON can be used on this host (baseline on aarch64)
#[inline]
pub fn has_neon() -> bool {
    cfg!(target_arch = "aarch64")
}
