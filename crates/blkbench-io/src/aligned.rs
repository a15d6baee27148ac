//! Aligned buffer for Direct I/O.
//!
//! When a device is opened with `O_DIRECT`, the kernel transfers straight
//! between user memory and the device, so the buffer's base address must be
//! a multiple of the device's logical sector size. `Vec<u8>` only guarantees
//! byte alignment, so `AlignedBuffer` allocates through `std::alloc` with an
//! explicit [`Layout`].

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

use crate::IoError;

/// A fixed-size buffer whose base address is a multiple of `alignment`.
///
/// The memory is zero-filled on allocation, but callers should treat the
/// initial contents as unspecified. The allocation is released on drop.
#[derive(Debug)]
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocates `size` bytes aligned to `alignment`.
    ///
    /// Fails with [`IoError::Allocation`] when `size` is zero, `alignment`
    /// is not a power of two, the rounded size overflows `isize`, or the
    /// allocator is out of memory.
    pub fn new(size: usize, alignment: usize) -> Result<Self, IoError> {
        let err = IoError::Allocation { size, alignment };
        if size == 0 {
            return Err(err);
        }
        let layout = Layout::from_size_align(size, alignment).map_err(|_| err)?;

        // SAFETY: `layout` has a non-zero size (checked above) and a valid
        // power-of-two alignment (checked by `Layout::from_size_align`).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(IoError::Allocation { size, alignment })?;

        Ok(Self { ptr, layout })
    }

    /// Returns the buffer contents as a slice.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` points to `layout.size()` initialized bytes owned by
        // `self`; the shared borrow of `self` prevents concurrent mutation.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Returns the buffer contents as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_slice`; the exclusive borrow of `self` rules out
        // aliasing.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Returns the base address of the buffer.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns the length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Always false; zero-sized buffers are rejected by [`AlignedBuffer::new`].
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Returns the alignment the buffer was allocated with.
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Returns true if the base address is a multiple of `alignment`.
    pub fn is_aligned_to(&self, alignment: usize) -> bool {
        alignment > 0 && is_aligned(self.as_ptr() as usize, alignment)
    }
}

impl AsRef<[u8]> for AlignedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for AlignedBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc_zeroed` with exactly this
        // layout and is not used after this point.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Returns true if `addr` is a multiple of `alignment`.
fn is_aligned(addr: usize, alignment: usize) -> bool {
    debug_assert!(alignment > 0, "alignment must be positive");
    addr % alignment == 0
}
