//! Arena allocation module
//!
//! # Arena Types
//!
//! - [`Arena`]: single-threaded region allocator over provider-owned blocks
//! - [`ArenaScope`]: RAII wrapper guaranteeing teardown on every exit path
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```
//! use guarded_arena::{Arena, ArenaConfig};
//!
//! let arena = Arena::new(ArenaConfig::default().with_initial_size(1024))?;
//! let numbers = arena.alloc_slice(&[1i32, 2, 3])?;
//! assert_eq!(numbers, &[1, 2, 3]);
//! # Ok::<(), guarded_arena::MemoryError>(())
//! ```
//!
//! Secure mode for sensitive data:
//!
//! ```no_run
//! use guarded_arena::Arena;
//!
//! let arena = Arena::secure_with_capacity(4096)?;
//! let secret = arena.alloc_str("key material")?;
//! // Blocks are locked in memory and wiped when the arena is dropped.
//! # Ok::<(), guarded_arena::MemoryError>(())
//! ```

use std::fmt;
use std::sync::Arc;

mod arena;
mod block;
mod observer;
mod scope;

pub use self::arena::Arena;
pub use self::observer::{AllocObserver, CountingObserver, ObserverSnapshot};
pub use self::scope::ArenaScope;

/// Arena configuration builder
#[derive(Clone, Default)]
pub struct ArenaConfig {
    /// Bytes reserved in the first block; `0` defers creation to first use
    pub initial_size: usize,
    /// Route block storage through guarded (locked, wipe-on-release) memory
    pub secure: bool,
    /// Optional observer notified on allocation and block lifecycle events
    pub observer: Option<Arc<dyn AllocObserver>>,
}

impl ArenaConfig {
    /// Creates a config with no eager block, plain memory, no observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial block size in bytes
    #[must_use = "builder methods must be chained or built"]
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Enables or disables guarded block storage
    #[must_use = "builder methods must be chained or built"]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Injects an allocation observer
    #[must_use = "builder methods must be chained or built"]
    pub fn with_observer(mut self, observer: Arc<dyn AllocObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for ArenaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaConfig")
            .field("initial_size", &self.initial_size)
            .field("secure", &self.secure)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let observer = Arc::new(CountingObserver::new());
        let config = ArenaConfig::new()
            .with_initial_size(8192)
            .with_secure(true)
            .with_observer(observer);

        assert_eq!(config.initial_size, 8192);
        assert!(config.secure);
        assert!(config.observer.is_some());
    }

    #[test]
    fn config_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.initial_size, 0);
        assert!(!config.secure);
        assert!(config.observer.is_none());

        let debug = format!("{config:?}");
        assert!(debug.contains("observer: false"));
    }
}
