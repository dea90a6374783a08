//! Block storage providers
//!
//! An arena never calls the system allocator directly. Every block buffer is
//! obtained from a [`BlockProvider`] chosen once, at arena construction:
//!
//! - [`HeapProvider`]: plain heap allocation via the global allocator
//! - [`GuardedProvider`]: locked, non-swappable pages that are wiped before
//!   being returned to the system
//!
//! The arena depends only on this capability contract, so alternative
//! backings (huge pages, NUMA-pinned buffers) can be slotted in without
//! touching the allocation algorithm.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::Result;

mod guarded;
mod heap;

pub use self::guarded::{init_guarded, GuardedProvider};
pub use self::heap::HeapProvider;

/// Capability interface for block buffer storage
///
/// Implementations hand out exclusively owned buffers: a pointer returned by
/// `allocate` belongs to exactly one block until it is passed back to
/// `release` on the same provider.
pub trait BlockProvider {
    /// Allocates a buffer for the given layout
    ///
    /// Returns [`MemoryError::OutOfMemory`](crate::MemoryError::OutOfMemory)
    /// when the underlying allocation fails, including when a guarded
    /// provider hits its page-locking limit.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Releases a buffer previously returned by [`allocate`](Self::allocate)
    ///
    /// Release errors are absorbed here: teardown must never fail
    /// observably, and the buffer must not leak on the happy path.
    ///
    /// # Safety
    ///
    /// The caller must pass the exact pointer and layout from a prior
    /// `allocate` on this provider, and must not use the pointer afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}
