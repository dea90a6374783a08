//! Guarded memory provider for sensitive data
//!
//! Buffers handed out by [`GuardedProvider`] are locked into physical memory
//! so they cannot be written to swap, and are overwritten with zeros before
//! their pages go back to the system. Intended for key material and other
//! secrets that must not outlive their arena.
//!
//! Page locking is a process-wide capability that may be unavailable
//! (missing privilege, RLIMIT_MEMLOCK of zero, unsupported platform), so the
//! subsystem is probed exactly once per process. A failed probe is fatal for
//! secure mode: constructing a provider afterwards keeps returning
//! [`MemoryError::SecureInitFailure`] and no guarded allocation is ever
//! attempted.

use std::alloc::{alloc, dealloc, Layout};
use std::io;
use std::ptr::NonNull;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::BlockProvider;
use crate::error::{MemoryError, Result};

/// Probe allocation size; page locking rounds to page granularity anyway.
const PROBE_SIZE: usize = 4096;

static INIT: OnceCell<std::result::Result<(), String>> = OnceCell::new();

/// Initializes the guarded-memory subsystem
///
/// Idempotent and process-wide: the first call probes whether pages can be
/// locked, every later call returns the recorded outcome. Arenas in secure
/// mode call this transparently during construction.
pub fn init_guarded() -> Result<()> {
    INIT.get_or_init(probe_page_locking)
        .clone()
        .map_err(|reason| MemoryError::SecureInitFailure { reason })
}

/// One-shot check that the platform can lock and unlock a page
fn probe_page_locking() -> std::result::Result<(), String> {
    let layout = match Layout::from_size_align(PROBE_SIZE, PROBE_SIZE) {
        Ok(layout) => layout,
        Err(e) => return Err(format!("probe layout: {e}")),
    };

    // SAFETY: layout is non-zero sized; the buffer is released before return
    // on every path below.
    let ptr = unsafe { alloc(layout) };
    let Some(ptr) = NonNull::new(ptr) else {
        return Err("probe allocation failed".to_string());
    };

    let outcome = lock_region(ptr.as_ptr(), PROBE_SIZE).and_then(|()| {
        let unlock = unlock_region(ptr.as_ptr(), PROBE_SIZE);
        if let Err(e) = &unlock {
            warn!(error = %e, "guarded probe could not unlock page");
        }
        unlock
    });

    // SAFETY: ptr was allocated with this exact layout just above.
    unsafe { dealloc(ptr.as_ptr(), layout) };

    match outcome {
        Ok(()) => {
            debug!("guarded memory subsystem initialized");
            Ok(())
        }
        Err(e) => Err(format!("page locking unavailable: {e}")),
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn lock_region(ptr: *mut u8, len: usize) -> io::Result<()> {
            // SAFETY: ptr..ptr+len is a live allocation owned by the caller;
            // mlock rounds to page boundaries internally.
            let rc = unsafe { libc::mlock(ptr as *const libc::c_void, len) };
            if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }

        fn unlock_region(ptr: *mut u8, len: usize) -> io::Result<()> {
            // SAFETY: same region that was passed to mlock.
            let rc = unsafe { libc::munlock(ptr as *const libc::c_void, len) };
            if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }
    } else if #[cfg(windows)] {
        fn lock_region(ptr: *mut u8, len: usize) -> io::Result<()> {
            use winapi::um::memoryapi::VirtualLock;
            // SAFETY: ptr..ptr+len is a live allocation owned by the caller.
            let rc = unsafe { VirtualLock(ptr.cast(), len) };
            if rc != 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }

        fn unlock_region(ptr: *mut u8, len: usize) -> io::Result<()> {
            use winapi::um::memoryapi::VirtualUnlock;
            // SAFETY: same region that was passed to VirtualLock.
            let rc = unsafe { VirtualUnlock(ptr.cast(), len) };
            if rc != 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }
    } else {
        fn lock_region(_ptr: *mut u8, _len: usize) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "page locking is not supported on this platform",
            ))
        }

        fn unlock_region(_ptr: *mut u8, _len: usize) -> io::Result<()> {
            Ok(())
        }
    }
}

/// Block provider backed by locked, wipe-on-release pages
///
/// Construction runs (or re-checks) the one-time subsystem init and fails
/// with [`MemoryError::SecureInitFailure`] if page locking is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct GuardedProvider {
    _priv: (),
}

impl GuardedProvider {
    /// Creates a guarded provider, initializing the subsystem if needed
    pub fn new() -> Result<Self> {
        init_guarded()?;
        Ok(GuardedProvider { _priv: () })
    }
}

impl BlockProvider for GuardedProvider {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        // SAFETY: layout has non-zero size and valid alignment.
        let ptr = unsafe { alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(MemoryError::OutOfMemory {
            requested: layout.size(),
        })?;

        if let Err(e) = lock_region(ptr.as_ptr(), layout.size()) {
            // Locking limit reached counts as an allocation failure: the
            // buffer must not be used unguarded.
            warn!(requested = layout.size(), error = %e, "page lock failed");
            // SAFETY: ptr was allocated with this layout just above and has
            // not been handed out.
            unsafe { dealloc(ptr.as_ptr(), layout) };
            return Err(MemoryError::OutOfMemory {
                requested: layout.size(),
            });
        }

        Ok(ptr)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr/layout came from allocate() on this
        // provider and the buffer is no longer referenced. The wipe uses
        // zeroize's volatile writes so it cannot be elided.
        unsafe {
            std::slice::from_raw_parts_mut(ptr.as_ptr(), layout.size()).zeroize();
        }

        if let Err(e) = unlock_region(ptr.as_ptr(), layout.size()) {
            warn!(error = %e, "page unlock failed during release");
        }

        // SAFETY: exact pointer/layout pair from allocate().
        unsafe { dealloc(ptr.as_ptr(), layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init_guarded();
        let second = init_guarded();
        assert_eq!(first, second);
    }

    #[test]
    fn guarded_round_trip_when_available() {
        // Page locking may legitimately be unavailable (RLIMIT_MEMLOCK of
        // zero in containers); only the success path is asserted here.
        let Ok(provider) = GuardedProvider::new() else {
            return;
        };

        let layout = Layout::from_size_align(128, 16).unwrap();
        let Ok(ptr) = provider.allocate(layout) else {
            return;
        };

        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0x5A, layout.size());
            provider.release(ptr, layout);
        }
    }

    #[test]
    fn new_surfaces_init_failure_kind() {
        match GuardedProvider::new() {
            Ok(_) => {}
            Err(MemoryError::SecureInitFailure { reason }) => {
                assert!(!reason.is_empty());
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
