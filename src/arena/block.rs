//! A single contiguous region in an arena's block list

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::utils::padding_needed;

/// One bump-allocated buffer plus its cursor
///
/// A block never frees or resizes itself: its buffer belongs to the provider
/// that created it, and the owning arena releases it during teardown. `used`
/// only moves forward, and `used <= capacity` holds at all times.
pub(crate) struct Block {
    base: NonNull<u8>,
    layout: Layout,
    used: usize,
}

impl Block {
    /// Wraps a provider-allocated buffer
    pub(crate) fn new(base: NonNull<u8>, layout: Layout) -> Self {
        Self {
            base,
            layout,
            used: 0,
        }
    }

    /// Total usable bytes in this block
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Bytes consumed so far, including alignment padding
    #[inline]
    pub(crate) fn used(&self) -> usize {
        self.used
    }

    /// Buffer start, for handing back to the provider
    #[inline]
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Layout the buffer was allocated with
    #[inline]
    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    /// Reserves `size` bytes at the next `align`-aligned offset
    ///
    /// Returns the aligned pointer and advances the cursor, or `None` when
    /// the request (including padding) does not fit. The arithmetic is
    /// checked so a near-`usize::MAX` request degrades to a miss instead of
    /// wrapping.
    pub(crate) fn bump(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        debug_assert!(align.is_power_of_two());

        let cursor = self.base.as_ptr() as usize + self.used;
        let padding = padding_needed(cursor, align);

        let new_used = self
            .used
            .checked_add(padding)?
            .checked_add(size)?;
        if new_used > self.capacity() {
            return None;
        }

        // SAFETY: used + padding <= new_used <= capacity, so the offset stays
        // inside the buffer allocated in new().
        let ptr = unsafe { self.base.as_ptr().add(self.used + padding) };
        self.used = new_used;
        NonNull::new(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BlockProvider, HeapProvider};
    use crate::utils::is_aligned;

    fn test_block(capacity: usize) -> (Block, HeapProvider) {
        let provider = HeapProvider::new();
        let layout = Layout::from_size_align(capacity, 16).unwrap();
        let base = provider.allocate(layout).unwrap();
        (Block::new(base, layout), provider)
    }

    fn release(block: Block, provider: &HeapProvider) {
        unsafe { provider.release(block.base(), block.layout()) };
    }

    #[test]
    fn cursor_advances_monotonically() {
        let (mut block, provider) = test_block(64);

        let p1 = block.bump(10, 1).unwrap();
        assert_eq!(block.used(), 10);

        let p2 = block.bump(10, 1).unwrap();
        assert_eq!(block.used(), 20);
        assert_eq!(p2.as_ptr() as usize - p1.as_ptr() as usize, 10);

        release(block, &provider);
    }

    #[test]
    fn padding_counts_toward_used() {
        let (mut block, provider) = test_block(64);

        block.bump(3, 1).unwrap();
        let p = block.bump(8, 8).unwrap();
        assert!(is_aligned(p.as_ptr() as usize, 8));
        // 3 bytes, then 5 bytes of padding to the next 8-byte boundary.
        assert_eq!(block.used(), 16);

        release(block, &provider);
    }

    #[test]
    fn full_block_misses() {
        let (mut block, provider) = test_block(32);

        assert!(block.bump(32, 1).is_some());
        assert!(block.bump(1, 1).is_none());
        assert_eq!(block.used(), 32);

        release(block, &provider);
    }

    #[test]
    fn oversized_request_does_not_wrap() {
        let (mut block, provider) = test_block(32);

        assert!(block.bump(usize::MAX - 4, 8).is_none());
        assert_eq!(block.used(), 0);

        release(block, &provider);
    }
}
