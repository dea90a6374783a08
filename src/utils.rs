//! Alignment helpers and overflow-safe size arithmetic

use crate::error::{MemoryError, Result};

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use guarded_arena::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Calculates padding needed to align an address
///
/// Equivalent to `(align - (addr % align)) % align` for power-of-two
/// alignments.
#[inline(always)]
pub const fn padding_needed(addr: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    align_up(addr, alignment) - addr
}

/// Computes `size * count` for an array request, rejecting overflow
///
/// Must run before any provider call so that an absurd request never
/// touches memory.
#[inline]
pub fn checked_array_size(size: usize, count: usize) -> Result<usize> {
    size.checked_mul(count)
        .ok_or(MemoryError::SizeOverflow { size, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_math() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(16, 16), 16);

        assert!(is_aligned(0x1000, 4096));
        assert!(!is_aligned(0x1001, 8));

        assert_eq!(padding_needed(7, 8), 1);
        assert_eq!(padding_needed(8, 8), 0);
        assert_eq!(padding_needed(9, 8), 7);
    }

    #[test]
    fn array_size_overflow() {
        assert_eq!(checked_array_size(8, 4).unwrap(), 32);
        assert_eq!(checked_array_size(0, 100).unwrap(), 0);

        let err = checked_array_size(usize::MAX / 2 + 1, 2).unwrap_err();
        assert!(matches!(err, MemoryError::SizeOverflow { .. }));
    }
}
