//! Allocation event observers
//!
//! The arena core keeps no global statistics. Callers that want process-wide
//! counters inject an [`AllocObserver`] through
//! [`ArenaConfig::with_observer`](super::ArenaConfig::with_observer); the
//! arena notifies it on every served allocation and every block it obtains
//! or returns. [`CountingObserver`] is the batteries-included
//! implementation.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Callback interface for allocation lifecycle events
///
/// Implementations must be cheap and non-blocking: they run inline on the
/// allocation path. All methods default to no-ops so observers can subscribe
/// to a subset of events.
pub trait AllocObserver: Send + Sync {
    /// A request was served from a block (`bytes` excludes padding)
    fn on_alloc(&self, bytes: usize) {
        let _ = bytes;
    }

    /// A new block of `bytes` capacity was obtained from the provider
    fn on_block_alloc(&self, bytes: usize) {
        let _ = bytes;
    }

    /// A block of `bytes` capacity was released back to the provider
    fn on_block_release(&self, bytes: usize) {
        let _ = bytes;
    }
}

/// Atomic counters over arena allocation events
///
/// Relaxed ordering throughout: the counters are monitoring data, not a
/// synchronization mechanism.
#[derive(Debug, Default)]
pub struct CountingObserver {
    allocations: AtomicU64,
    bytes_served: AtomicUsize,
    blocks_allocated: AtomicUsize,
    blocks_released: AtomicUsize,
    bytes_reserved: AtomicUsize,
}

impl CountingObserver {
    /// Creates a new zeroed observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocations served
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Payload bytes handed to callers (padding excluded)
    pub fn bytes_served(&self) -> usize {
        self.bytes_served.load(Ordering::Relaxed)
    }

    /// Blocks obtained from the provider over the observer's lifetime
    pub fn blocks_allocated(&self) -> usize {
        self.blocks_allocated.load(Ordering::Relaxed)
    }

    /// Blocks returned to the provider
    pub fn blocks_released(&self) -> usize {
        self.blocks_released.load(Ordering::Relaxed)
    }

    /// Capacity bytes currently held in live blocks
    pub fn bytes_reserved(&self) -> usize {
        self.bytes_reserved.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of all counters
    pub fn snapshot(&self) -> ObserverSnapshot {
        ObserverSnapshot {
            allocations: self.allocations(),
            bytes_served: self.bytes_served(),
            blocks_allocated: self.blocks_allocated(),
            blocks_released: self.blocks_released(),
            bytes_reserved: self.bytes_reserved(),
        }
    }
}

impl AllocObserver for CountingObserver {
    fn on_alloc(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_block_alloc(&self, bytes: usize) {
        self.blocks_allocated.fetch_add(1, Ordering::Relaxed);
        self.bytes_reserved.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_block_release(&self, bytes: usize) {
        self.blocks_released.fetch_add(1, Ordering::Relaxed);
        self.bytes_reserved.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Point-in-time view of a [`CountingObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverSnapshot {
    /// Allocations served
    pub allocations: u64,
    /// Payload bytes handed to callers
    pub bytes_served: usize,
    /// Blocks obtained from the provider
    pub blocks_allocated: usize,
    /// Blocks returned to the provider
    pub blocks_released: usize,
    /// Capacity bytes currently held in live blocks
    pub bytes_reserved: usize,
}

impl fmt::Display for ObserverSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} allocations, {} bytes served, {} blocks live ({} bytes)",
            self.allocations,
            self.bytes_served,
            self.blocks_allocated.saturating_sub(self.blocks_released),
            self.bytes_reserved,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_events() {
        let observer = CountingObserver::new();

        observer.on_block_alloc(1024);
        observer.on_alloc(40);
        observer.on_alloc(24);
        observer.on_block_release(1024);

        assert_eq!(observer.allocations(), 2);
        assert_eq!(observer.bytes_served(), 64);
        assert_eq!(observer.blocks_allocated(), 1);
        assert_eq!(observer.blocks_released(), 1);
        assert_eq!(observer.bytes_reserved(), 0);
    }

    #[test]
    fn snapshot_is_stable_copy() {
        let observer = CountingObserver::new();
        observer.on_block_alloc(64);

        let snap = observer.snapshot();
        observer.on_block_alloc(64);

        assert_eq!(snap.blocks_allocated, 1);
        assert_eq!(observer.blocks_allocated(), 2);
        assert!(snap.to_string().contains("1 blocks live"));
    }
}
