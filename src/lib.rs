//! Region-based memory allocation with an optional guarded mode
//!
//! This crate replaces many short-lived heap allocations with a handful of
//! large block allocations and a single, cheap teardown:
//!
//! - [`Arena`]: bump allocator over an append-only list of blocks; nothing
//!   is freed individually, the whole region is released in one pass
//! - [`ArenaScope`]: RAII wrapper that guarantees the release on every exit
//!   path of the owning scope
//! - [`provider`]: the storage capability behind the blocks — plain heap,
//!   or guarded memory (locked pages, wiped on release) for key material
//!   and other secrets
//! - [`CountingObserver`]: optional injected counters over allocation and
//!   block lifecycle events
//!
//! # Example
//!
//! ```
//! use guarded_arena::ArenaScope;
//!
//! let scope = ArenaScope::with_capacity(1024)?;
//!
//! let numbers = scope.alloc_slice(&[1u32, 2, 3, 4])?;
//! let label = scope.alloc_str("batch-1")?;
//! assert_eq!(numbers.len(), 4);
//! assert_eq!(label, "batch-1");
//! // Dropping the scope releases every block at once.
//! # Ok::<(), guarded_arena::MemoryError>(())
//! ```
//!
//! # Concurrency
//!
//! An arena and the pointers it returns follow single-threaded ownership:
//! there is no internal locking, and sharing one across threads requires
//! external synchronization. Observers, in contrast, are `Send + Sync` and
//! may be shared process-wide.

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod provider;
pub mod utils;

pub use arena::{AllocObserver, Arena, ArenaConfig, ArenaScope, CountingObserver, ObserverSnapshot};
pub use error::{MemoryError, Result};
pub use provider::{init_guarded, BlockProvider, GuardedProvider, HeapProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
