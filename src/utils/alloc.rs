use crate::error::{Result, SyncError};
use crate::utils::report;

use std::alloc::{Layout, alloc_zeroed};

/// Allocates zeroed, heap-pinned storage for an OS primitive.
///
/// Unlike `Box::new`, an allocation failure does not abort: it is reported
/// as fatal and returned as [`SyncError::OutOfMemory`], leaving the caller
/// without a handle.
///
/// # Safety
///
/// The all-zero bit pattern must be a valid value of `T`. This holds for the
/// plain C structs (`pthread_mutex_t`, `SRWLOCK`, ...) this is used for;
/// zero is `SRWLOCK_INIT`, and the pthread types are initialized in place
/// afterwards.
pub(crate) unsafe fn zeroed_box<T>(what: &'static str) -> Result<Box<T>> {
    let layout = Layout::new::<T>();
    debug_assert!(layout.size() > 0, "zero-sized primitive");

    let ptr = unsafe { alloc_zeroed(layout) } as *mut T;
    unsafe { into_box(ptr, layout, what) }
}

/// Turns a raw allocation into a `Box`, or reports the failure.
///
/// # Safety
///
/// `ptr` must be null or point to an allocation of `layout` made by the
/// global allocator and holding a valid `T`.
unsafe fn into_box<T>(ptr: *mut T, layout: Layout, what: &'static str) -> Result<Box<T>> {
    if ptr.is_null() {
        return report::fail(SyncError::OutOfMemory {
            what,
            size: layout.size(),
        });
    }

    Ok(unsafe { Box::from_raw(ptr) })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ptr;

    #[test]
    fn test_null_allocation_is_reported_as_oom() {
        let result = unsafe { into_box::<u64>(ptr::null_mut(), Layout::new::<u64>(), "test") };

        match result {
            Err(SyncError::OutOfMemory { what, size }) => {
                assert_eq!(what, "test");
                assert_eq!(size, 8);
            }
            other => panic!("expected OutOfMemory, got {other:?}"),
        }
    }

    #[test]
    fn test_zeroed_box_is_zeroed() {
        let boxed = unsafe { zeroed_box::<[u32; 16]>("test") }.unwrap();
        assert!(boxed.iter().all(|&word| word == 0));
    }
}
