//! Error types for arena and provider operations

use thiserror::Error;

/// Result type for arena operations
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Memory operation errors
///
/// `OutOfMemory` and `SizeOverflow` are recoverable: the arena that reported
/// them stays valid and will keep serving smaller requests.
/// `SecureInitFailure` is not: once the guarded-memory subsystem fails to
/// initialize, no secure allocation may proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The backing provider could not satisfy a block allocation
    #[error("out of memory: requested {requested} bytes")]
    OutOfMemory {
        /// Bytes requested from the provider
        requested: usize,
    },

    /// `size * count` exceeds the address-space range
    #[error("size overflow: {size} x {count} elements exceeds usize::MAX")]
    SizeOverflow {
        /// Element size in bytes
        size: usize,
        /// Number of elements
        count: usize,
    },

    /// Alignment is not a power of two
    #[error("invalid alignment: {align} is not a power of two")]
    InvalidAlignment {
        /// The rejected alignment value
        align: usize,
    },

    /// One-time guarded-memory subsystem initialization failed
    #[error("guarded memory initialization failed: {reason}")]
    SecureInitFailure {
        /// Platform diagnostic captured during the init probe
        reason: String,
    },
}

impl MemoryError {
    /// Creates an out of memory error
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Creates a size overflow error
    pub fn size_overflow(size: usize, count: usize) -> Self {
        Self::SizeOverflow { size, count }
    }

    /// Creates an invalid alignment error
    pub fn invalid_alignment(align: usize) -> Self {
        Self::InvalidAlignment { align }
    }

    /// Creates a secure init failure error
    pub fn secure_init_failure(reason: impl Into<String>) -> Self {
        Self::SecureInitFailure {
            reason: reason.into(),
        }
    }

    /// Returns true if the caller may retry with a smaller request
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SecureInitFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let err = MemoryError::out_of_memory(4096);
        assert_eq!(err.to_string(), "out of memory: requested 4096 bytes");

        let err = MemoryError::size_overflow(usize::MAX, 2);
        assert!(err.to_string().contains("size overflow"));

        let err = MemoryError::invalid_alignment(3);
        assert_eq!(err.to_string(), "invalid alignment: 3 is not a power of two");
    }

    #[test]
    fn recoverability() {
        assert!(MemoryError::out_of_memory(1).is_recoverable());
        assert!(MemoryError::size_overflow(8, usize::MAX).is_recoverable());
        assert!(!MemoryError::secure_init_failure("probe failed").is_recoverable());
    }
}
