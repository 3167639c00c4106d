//! Target memory buffer.
//!
//! A contiguous byte region shared by protocol memory commands and core
//! load/store paths. On unix the region is an anonymous `mmap`, so large
//! defaults stay lazy; elsewhere a leaked `Vec` backs it.
//!
//! Allocation degrades rather than aborts: if the requested size cannot be
//! mapped, the request shrinks by 10/11 (rounded down to the page quantum)
//! and retries until a mapping succeeds or the size rounds to zero.

use tracing::warn;

use crate::common::constants::{DEFAULT_MEM_BYTES, MEM_SHRINK_DEN, MEM_SHRINK_NUM};
use crate::common::error::SimError;

/// The simulated machine's physical memory.
#[derive(Debug)]
pub struct TargetMemory {
    ptr: *mut u8,
    size: usize,
}

// SAFETY: the buffer is plain bytes behind a raw pointer; access discipline
// (strict alternation between protocol and cores) is enforced by the driver
// loop, never by the type.
unsafe impl Send for TargetMemory {}
unsafe impl Sync for TargetMemory {}

impl TargetMemory {
    /// Allocates target memory, shrinking on failure.
    ///
    /// `mem_mb == 0` selects the platform default. Emits a warning when the
    /// mapped size ends up below the request; fails only when shrinking
    /// bottoms out at zero.
    pub fn allocate(mem_mb: usize) -> Result<Self, SimError> {
        let requested = if mem_mb == 0 {
            DEFAULT_MEM_BYTES
        } else {
            mem_mb << 20
        };
        let quantum = page_size();
        let requested = requested / quantum * quantum;
        if requested == 0 {
            return Err(SimError::OutOfMemory { requested });
        }

        let mut size = requested;
        loop {
            if let Some(ptr) = map_anonymous(size) {
                if size < requested {
                    warn!(
                        wanted = requested,
                        got = size,
                        "only got part of the requested target memory"
                    );
                }
                return Ok(Self { ptr, size });
            }
            size = size * MEM_SHRINK_NUM / MEM_SHRINK_DEN / quantum * quantum;
            if size == 0 {
                return Err(SimError::OutOfMemory { requested });
            }
        }
    }

    /// Size of the region in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Whether the region is empty (never true for a constructed buffer).
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Loads a little-endian 8-byte word at a byte offset.
    pub fn load_u64(&self, offset: u64) -> u64 {
        let offset = offset as usize;
        assert!(offset + 8 <= self.size, "target memory read out of bounds");
        let mut word = [0u8; 8];
        // SAFETY: bounds checked above; source and destination never overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.add(offset), word.as_mut_ptr(), 8);
        }
        u64::from_le_bytes(word)
    }

    /// Stores a little-endian 8-byte word at a byte offset.
    pub fn store_u64(&self, offset: u64, value: u64) {
        let offset = offset as usize;
        assert!(offset + 8 <= self.size, "target memory write out of bounds");
        let word = value.to_le_bytes();
        // SAFETY: bounds checked above; source and destination never overlap.
        unsafe {
            std::ptr::copy_nonoverlapping(word.as_ptr(), self.ptr.add(offset), 8);
        }
    }
}

impl Drop for TargetMemory {
    fn drop(&mut self) {
        #[cfg(unix)]
        // SAFETY: ptr/size came from a successful mmap and are unmapped once.
        unsafe {
            let _ = libc::munmap(self.ptr.cast(), self.size);
        }
        #[cfg(not(unix))]
        // SAFETY: ptr/size came from a leaked Vec with capacity == size.
        unsafe {
            let _ = Vec::from_raw_parts(self.ptr, self.size, self.size);
        }
    }
}

#[cfg(unix)]
fn map_anonymous(size: usize) -> Option<*mut u8> {
    // SAFETY: anonymous private mapping, no fd, result checked below.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        None
    } else {
        Some(ptr.cast())
    }
}

#[cfg(not(unix))]
fn map_anonymous(size: usize) -> Option<*mut u8> {
    let mut vec = vec![0u8; size];
    let ptr = vec.as_mut_ptr();
    std::mem::forget(vec);
    Some(ptr)
}

/// Host page size; allocation sizes round down to this quantum.
pub fn page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf with a valid name has no preconditions.
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page > 0 { page as usize } else { 4096 }
    }
    #[cfg(not(unix))]
    {
        4096
    }
}
