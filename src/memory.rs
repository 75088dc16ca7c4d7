//! Cache-line aligned heap buffers
//!
//! Loaded files live in a 64-byte aligned allocation so every scanned chunk
//! starts on a known boundary.

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use crate::error::LoadError;

/// Alignment of every [`AlignedBuffer`]
pub const BUFFER_ALIGNMENT: usize = 64;

/// An owned, 64-byte aligned, fixed-length byte buffer
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

// SAFETY: the allocation is uniquely owned and holds plain bytes
unsafe impl Send for AlignedBuffer {}
// SAFETY: shared access only hands out `&[u8]`
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `len` zeroed bytes
    pub fn zeroed(len: usize) -> Result<Self, LoadError> {
        // zero-sized layouts cannot be passed to the allocator
        let layout = Layout::from_size_align(len.max(1), BUFFER_ALIGNMENT)
            .map_err(|_| LoadError::AllocFailed { len })?;

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(LoadError::AllocFailed { len })?;

        // SAFETY: ptr is valid for layout.size() writes
        unsafe { ptr.as_ptr().write_bytes(0, layout.size()) };

        Ok(Self { ptr, len, layout })
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid and initialized for len bytes
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid and initialized for len bytes, and &mut self
        // guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }
}

impl std::ops::Deref for AlignedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated in `zeroed` with this exact layout
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_write() {
        let mut buffer = AlignedBuffer::zeroed(1024).unwrap();

        assert_eq!(
            buffer.as_ptr() as usize % BUFFER_ALIGNMENT,
            0,
            "Buffer should be 64-byte aligned"
        );
        assert!(buffer.iter().all(|&b| b == 0));

        buffer.as_mut_slice()[0] = 42;
        assert_eq!(buffer[0], 42);
        assert_eq!(buffer.len(), 1024);
    }

    #[test]
    fn test_zero_length() {
        let buffer = AlignedBuffer::zeroed(0).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_slice(), b"");
    }
}
