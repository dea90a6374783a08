//! RAII helper for scoped arena lifetimes
//!
//! The region must be released on every exit path from its owning scope,
//! including early returns and `?` propagation. [`ArenaScope`] expresses
//! that as ownership: the wrapper tears the arena down in `Drop`, so a
//! forgotten cleanup call cannot leak the region.

use std::ops::{Deref, DerefMut};

use super::{Arena, ArenaConfig};
use crate::error::Result;

/// Owns an arena and guarantees teardown when the scope ends
///
/// Dereferences to [`Arena`], so every allocation method is available
/// directly on the scope.
///
/// # Examples
///
/// ```
/// use guarded_arena::ArenaScope;
///
/// fn parse(input: &str) -> Result<usize, guarded_arena::MemoryError> {
///     let scope = ArenaScope::with_capacity(1024)?;
///     let copy = scope.alloc_str(input)?;
///     // Early returns and `?` below all release the region.
///     Ok(copy.len())
/// }
///
/// assert_eq!(parse("abc").unwrap(), 3);
/// ```
pub struct ArenaScope {
    arena: Arena,
}

impl ArenaScope {
    /// Creates a scope around a new arena with the given configuration
    pub fn new(config: ArenaConfig) -> Result<Self> {
        Ok(Self {
            arena: Arena::new(config)?,
        })
    }

    /// Creates a scope around a plain arena with the given initial size
    pub fn with_capacity(initial_size: usize) -> Result<Self> {
        Ok(Self {
            arena: Arena::with_capacity(initial_size)?,
        })
    }

    /// Creates a scope around a secure arena with the given initial size
    pub fn secure_with_capacity(initial_size: usize) -> Result<Self> {
        Ok(Self {
            arena: Arena::secure_with_capacity(initial_size)?,
        })
    }

    /// Borrows the underlying arena
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Consumes the scope and hands the arena back to the caller
    ///
    /// The arena's own `Drop` still guarantees teardown; this only moves
    /// the responsibility.
    pub fn into_inner(self) -> Arena {
        self.arena
    }
}

impl Deref for ArenaScope {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        &self.arena
    }
}

impl DerefMut for ArenaScope {
    fn deref_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::CountingObserver;
    use crate::error::MemoryError;
    use std::sync::Arc;

    #[test]
    fn scope_releases_on_normal_exit() {
        let observer = Arc::new(CountingObserver::new());
        {
            let scope = ArenaScope::new(
                ArenaConfig::default()
                    .with_initial_size(64)
                    .with_observer(observer.clone()),
            )
            .unwrap();
            scope.alloc(1u32).unwrap();
        }
        assert_eq!(observer.blocks_released(), 1);
        assert_eq!(observer.bytes_reserved(), 0);
    }

    #[test]
    fn scope_releases_on_error_path() {
        let observer = Arc::new(CountingObserver::new());

        fn failing(observer: Arc<CountingObserver>) -> Result<()> {
            let scope = ArenaScope::new(
                ArenaConfig::default()
                    .with_initial_size(64)
                    .with_observer(observer),
            )?;
            scope.alloc(9u8)?;
            scope.alloc_raw(usize::MAX / 2 + 1, 8, 2)?;
            unreachable!("overflow must propagate");
        }

        let err = failing(observer.clone()).unwrap_err();
        assert!(matches!(err, MemoryError::SizeOverflow { .. }));
        assert_eq!(observer.blocks_released(), observer.blocks_allocated());
        assert_eq!(observer.bytes_reserved(), 0);
    }

    #[test]
    fn scope_derefs_to_arena() {
        let mut scope = ArenaScope::with_capacity(128).unwrap();
        let s = scope.alloc_str("scoped").unwrap();
        assert_eq!(s, "scoped");
        assert_eq!(scope.arena().block_count(), 1);

        scope.destroy();
        assert_eq!(scope.block_count(), 0);
    }
}
