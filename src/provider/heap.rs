//! Plain heap provider backed by the global allocator

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

use super::BlockProvider;
use crate::error::{MemoryError, Result};

/// Block provider that delegates to the global allocator
///
/// This is the default backing for non-secure arenas. It is a zero-sized,
/// stateless handle; all bookkeeping lives in the arena that owns the
/// blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapProvider;

impl HeapProvider {
    /// Creates a new heap provider
    #[inline]
    pub const fn new() -> Self {
        HeapProvider
    }
}

impl BlockProvider for HeapProvider {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        // SAFETY: layout has non-zero size (the arena never requests empty
        // blocks) and a valid power-of-two alignment enforced by Layout.
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).ok_or(MemoryError::OutOfMemory {
            requested: layout.size(),
        })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr/layout came from allocate() above
        // and that the buffer is no longer referenced.
        unsafe { dealloc(ptr.as_ptr(), layout) };
    }
}
