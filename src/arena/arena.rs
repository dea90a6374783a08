//! Region-based bump allocator
//!
//! # Safety
//!
//! This module implements a single-threaded bump allocator over a list of
//! provider-owned blocks:
//! - RefCell around the block list (runtime borrow checking, no locking)
//! - blocks are append-only; earlier blocks are never revisited or resized
//! - the cursor of each block only moves forward
//! - every buffer comes from, and is returned to, the arena's one provider
//!
//! ## Invariants
//!
//! - returned pointers lie in `[base, base + capacity)` of some block, with
//!   `offset + size <= used <= capacity` at the time of the call
//! - allocations never overlap and are never invalidated by later calls
//! - a single allocation appends at most one block
//! - teardown releases every block exactly once and is idempotent
//!
//! ## Not Thread-Safe
//!
//! Uses `RefCell` instead of atomics; the arena provides no internal
//! synchronization and is `!Sync` by construction. Share it across threads
//! only under external synchronization.

use std::cell::RefCell;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use tracing::{debug, warn};

use super::block::Block;
use super::observer::AllocObserver;
use super::ArenaConfig;
use crate::error::{MemoryError, Result};
use crate::provider::{BlockProvider, GuardedProvider, HeapProvider};
use crate::utils::checked_array_size;

/// Minimum alignment of block buffers
///
/// Matching common `malloc` guarantees keeps the first allocation in a fresh
/// block padding-free for every alignment up to 16.
const BLOCK_ALIGN: usize = 16;

/// Region-based bump allocator
///
/// Allocations are served by advancing a cursor through the current tail
/// block; when the tail is full a new, geometrically larger block is
/// appended. Nothing is freed individually: [`destroy`](Arena::destroy) (or
/// `Drop`) releases the whole region in one pass.
///
/// # Examples
///
/// ```
/// use guarded_arena::{Arena, ArenaConfig};
///
/// let arena = Arena::new(ArenaConfig::default())?;
/// let value = arena.alloc(42u32)?;
/// assert_eq!(*value, 42);
/// # Ok::<(), guarded_arena::MemoryError>(())
/// ```
pub struct Arena {
    blocks: RefCell<Vec<Block>>,
    provider: Box<dyn BlockProvider>,
    secure: bool,
    observer: Option<Arc<dyn AllocObserver>>,
}

impl Arena {
    /// Creates an arena from a configuration
    ///
    /// With `initial_size > 0` the first block is reserved eagerly, so
    /// provider failures surface here rather than at the first allocation.
    /// `initial_size == 0` defers block creation until first use.
    ///
    /// # Errors
    ///
    /// [`MemoryError::SecureInitFailure`] when secure mode is requested and
    /// the guarded-memory subsystem cannot initialize;
    /// [`MemoryError::OutOfMemory`] when the eager first block cannot be
    /// allocated.
    pub fn new(config: ArenaConfig) -> Result<Self> {
        let provider: Box<dyn BlockProvider> = if config.secure {
            Box::new(GuardedProvider::new()?)
        } else {
            Box::new(HeapProvider::new())
        };

        let arena = Self {
            blocks: RefCell::new(Vec::new()),
            provider,
            secure: config.secure,
            observer: config.observer,
        };

        if config.initial_size > 0 {
            let mut blocks = arena.blocks.borrow_mut();
            arena.grow(&mut blocks, config.initial_size, BLOCK_ALIGN)?;
        }

        Ok(arena)
    }

    /// Creates a plain arena with the given initial block size
    pub fn with_capacity(initial_size: usize) -> Result<Self> {
        Self::new(ArenaConfig::default().with_initial_size(initial_size))
    }

    /// Creates a secure arena with the given initial block size
    ///
    /// Block storage is locked into memory and wiped on release; see
    /// [`GuardedProvider`].
    pub fn secure_with_capacity(initial_size: usize) -> Result<Self> {
        Self::new(
            ArenaConfig::default()
                .with_initial_size(initial_size)
                .with_secure(true),
        )
    }

    /// Allocates `count` elements of `size` bytes at `align`, zero-filled
    ///
    /// Returns `Ok(None)` when `size == 0 || count == 0`: nothing to
    /// allocate is not an error. On success the returned region is disjoint
    /// from every region previously returned by this arena and stays valid
    /// until teardown.
    ///
    /// # Errors
    ///
    /// [`MemoryError::InvalidAlignment`] when `align` is not a power of two,
    /// [`MemoryError::SizeOverflow`] when `size * count` is not
    /// representable (checked before any memory is touched), and
    /// [`MemoryError::OutOfMemory`] when the provider cannot supply a new
    /// block. After any of these the arena remains valid.
    pub fn alloc_raw(&self, size: usize, align: usize, count: usize) -> Result<Option<NonNull<u8>>> {
        self.alloc_inner(size, align, count, true)
    }

    /// Allocates like [`alloc_raw`](Arena::alloc_raw) but skips the zero fill
    ///
    /// For call sites that immediately overwrite the region. The contents
    /// are uninitialized; no guarantee is made about them.
    pub fn alloc_raw_uninit(
        &self,
        size: usize,
        align: usize,
        count: usize,
    ) -> Result<Option<NonNull<u8>>> {
        self.alloc_inner(size, align, count, false)
    }

    fn alloc_inner(
        &self,
        size: usize,
        align: usize,
        count: usize,
        zero: bool,
    ) -> Result<Option<NonNull<u8>>> {
        if !align.is_power_of_two() {
            return Err(MemoryError::invalid_alignment(align));
        }
        if size == 0 || count == 0 {
            return Ok(None);
        }

        let total = checked_array_size(size, count)?;

        let mut blocks = self.blocks.borrow_mut();
        let ptr = match blocks.last_mut().and_then(|tail| tail.bump(total, align)) {
            Some(ptr) => ptr,
            None => {
                // At most one growth per call: the new block is sized and
                // aligned for this request, so the retry cannot miss.
                self.grow(&mut blocks, total, align)?;
                blocks
                    .last_mut()
                    .and_then(|tail| tail.bump(total, align))
                    .ok_or(MemoryError::OutOfMemory { requested: total })?
            }
        };
        drop(blocks);

        if zero {
            // SAFETY: bump() reserved total bytes at ptr inside a live
            // block; the region is exclusively ours until handed out.
            unsafe { ptr::write_bytes(ptr.as_ptr(), 0, total) };
        }

        if let Some(observer) = &self.observer {
            observer.on_alloc(total);
        }

        Ok(Some(ptr))
    }

    /// Appends one block sized `max(2 x tail capacity, min_size)`
    ///
    /// An empty list gets exactly `min_size`. On failure the existing list
    /// is untouched and stays valid.
    fn grow(&self, blocks: &mut Vec<Block>, min_size: usize, align: usize) -> Result<()> {
        let capacity = match blocks.last() {
            Some(last) => last.capacity().saturating_mul(2).max(min_size),
            None => min_size,
        };

        let layout = std::alloc::Layout::from_size_align(capacity, align.max(BLOCK_ALIGN))
            .map_err(|_| MemoryError::OutOfMemory {
                requested: capacity,
            })?;

        let base = match self.provider.allocate(layout) {
            Ok(base) => base,
            Err(e) => {
                warn!(requested = capacity, error = %e, "block allocation failed");
                return Err(e);
            }
        };

        blocks.push(Block::new(base, layout));
        debug!(
            capacity,
            blocks = blocks.len(),
            secure = self.secure,
            "appended arena block"
        );

        if let Some(observer) = &self.observer {
            observer.on_block_alloc(capacity);
        }

        Ok(())
    }

    /// Allocates and initializes a value
    ///
    /// The reference is valid until the arena is destroyed or dropped; the
    /// value's `Drop` is never run (arena discipline).
    #[must_use = "allocated memory must be used"]
    pub fn alloc<T>(&self, value: T) -> Result<&mut T> {
        match self.alloc_raw_uninit(mem::size_of::<T>(), mem::align_of::<T>(), 1)? {
            Some(ptr) => {
                let ptr = ptr.as_ptr().cast::<T>();
                // SAFETY: the region is size_of::<T>() bytes at
                // align_of::<T>(), exclusively ours, and lives as long as
                // the arena; write moves the value in before the reference
                // is created.
                unsafe {
                    ptr.write(value);
                    Ok(&mut *ptr)
                }
            }
            None => {
                // T is zero-sized; a well-aligned dangling pointer is a
                // valid place for it.
                let ptr = NonNull::<T>::dangling().as_ptr();
                // SAFETY: writes and references to ZSTs through a dangling,
                // aligned pointer are valid.
                unsafe {
                    ptr.write(value);
                    Ok(&mut *ptr)
                }
            }
        }
    }

    /// Allocates and copies a slice
    #[must_use = "allocated memory must be used"]
    pub fn alloc_slice<T: Copy>(&self, slice: &[T]) -> Result<&mut [T]> {
        if slice.is_empty() {
            return Ok(&mut []);
        }

        match self.alloc_raw_uninit(mem::size_of::<T>(), mem::align_of::<T>(), slice.len())? {
            Some(ptr) => {
                let ptr = ptr.as_ptr().cast::<T>();
                // SAFETY: the region holds slice.len() elements of T at T's
                // alignment; source and destination cannot overlap because
                // the destination was just reserved.
                unsafe {
                    ptr::copy_nonoverlapping(slice.as_ptr(), ptr, slice.len());
                    Ok(std::slice::from_raw_parts_mut(ptr, slice.len()))
                }
            }
            None => {
                // Zero-sized element type.
                let ptr = NonNull::<T>::dangling().as_ptr();
                // SAFETY: a slice of ZSTs may live at any aligned dangling
                // address.
                unsafe { Ok(std::slice::from_raw_parts_mut(ptr, slice.len())) }
            }
        }
    }

    /// Allocates a string
    #[must_use = "allocated memory must be used"]
    pub fn alloc_str(&self, s: &str) -> Result<&str> {
        let bytes = self.alloc_slice(s.as_bytes())?;
        // SAFETY: bytes are an exact copy of a valid &str.
        unsafe { Ok(std::str::from_utf8_unchecked(bytes)) }
    }

    /// Releases every block and leaves the arena empty and reusable
    ///
    /// Never fails observably; a second call is a no-op. `Drop` performs
    /// the same teardown, so explicit calls are only needed to reclaim the
    /// region before the arena value goes out of scope.
    pub fn destroy(&mut self) {
        let blocks = self.blocks.get_mut();
        if blocks.is_empty() {
            return;
        }

        let released = blocks.len();
        for block in blocks.drain(..) {
            let capacity = block.capacity();
            // SAFETY: every block's base/layout pair came from exactly this
            // provider, and draining guarantees each is released once.
            unsafe { self.provider.release(block.base(), block.layout()) };

            if let Some(observer) = &self.observer {
                observer.on_block_release(capacity);
            }
        }

        debug!(released, secure = self.secure, "arena destroyed");
    }

    /// Bytes consumed across all blocks, including alignment padding
    pub fn used(&self) -> usize {
        self.blocks.borrow().iter().map(Block::used).sum()
    }

    /// Total capacity currently reserved from the provider
    pub fn capacity(&self) -> usize {
        self.blocks.borrow().iter().map(Block::capacity).sum()
    }

    /// Number of blocks in the chain
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Whether this arena stores blocks in guarded memory
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.block_count())
            .field("used", &self.used())
            .field("capacity", &self.capacity())
            .field("secure", &self.secure)
            .finish()
    }
}
