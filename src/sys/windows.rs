//! Windows platform layer.
//!
//! This module mirrors the Unix platform layer and exposes identical
//! type and function names. Mutexes are slim reader/writer locks taken in
//! exclusive mode; there is no native condition variable here, only the
//! two event objects the emulation is built on.

use crate::error::{Result, SyncError};
use crate::sys::common::{Notify, Timeout, Wake};
use crate::utils::{alloc, report};

use std::cell::UnsafeCell;
use std::{io, ptr};

use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
use windows_sys::Win32::System::SystemInformation::GetTickCount64;
use windows_sys::Win32::System::Threading::{
    AcquireSRWLockExclusive, CreateEventW, INFINITE, ReleaseSRWLockExclusive, ResetEvent,
    SRWLOCK, SetEvent, TryAcquireSRWLockExclusive, WaitForMultipleObjects,
};

/// Slot of the auto-reset event in the handle array.
const SIGNAL: usize = 0;

/// Slot of the manual-reset event in the handle array.
const BROADCAST: usize = 1;

/// Current monotonic time in milliseconds.
pub(crate) fn tick() -> u64 {
    unsafe { GetTickCount64() }
}

/// Converts a timeout into the `DWORD` expected by the wait functions.
///
/// Finite timeouts are clamped below `INFINITE` so a very long wait never
/// turns into an unbounded one.
fn millis(timeout: Timeout) -> u32 {
    match timeout {
        Timeout::Infinite => INFINITE,
        Timeout::Millis(ms) if ms >= INFINITE as u64 => INFINITE - 1,
        Timeout::Millis(ms) => ms as u32,
    }
}

/// An `SRWLOCK` used in exclusive mode only.
///
/// Not re-entrant: acquiring it again from the owning thread never
/// succeeds, so a second guard over the same data cannot exist.
pub struct RawMutex {
    inner: Box<UnsafeCell<SRWLOCK>>,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    pub(crate) fn new(what: &'static str) -> Result<Self> {
        // All-zero is `SRWLOCK_INIT`; no further initialization needed.
        let inner: Box<UnsafeCell<SRWLOCK>> = unsafe { alloc::zeroed_box(what)? };

        Ok(Self { inner })
    }

    pub(crate) fn lock(&self) {
        unsafe { AcquireSRWLockExclusive(self.inner.get()) };
    }

    pub(crate) fn try_lock(&self) -> bool {
        unsafe { TryAcquireSRWLockExclusive(self.inner.get()) != 0 }
    }

    /// # Safety
    ///
    /// The calling thread must hold the lock.
    pub(crate) unsafe fn unlock(&self) {
        unsafe { ReleaseSRWLockExclusive(self.inner.get()) };
    }
}

/// An auto-reset "signal" event and a manual-reset "broadcast" event.
pub struct Events {
    handles: [HANDLE; 2],
}

unsafe impl Send for Events {}
unsafe impl Sync for Events {}

impl Events {
    /// Creates both events in the unsignaled state.
    pub(crate) fn new() -> Result<Self> {
        let signal = unsafe { CreateEventW(ptr::null(), 0, 0, ptr::null()) };
        if signal.is_null() {
            return report::fail(SyncError::Init {
                what: "Condvar::new",
                source: io::Error::last_os_error(),
            });
        }

        let broadcast = unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) };
        if broadcast.is_null() {
            let source = io::Error::last_os_error();
            unsafe { CloseHandle(signal) };
            return report::fail(SyncError::Init {
                what: "Condvar::new",
                source,
            });
        }

        let mut handles = [ptr::null_mut(); 2];
        handles[SIGNAL] = signal;
        handles[BROADCAST] = broadcast;

        Ok(Self { handles })
    }

    fn handle(&self, which: Notify) -> HANDLE {
        match which {
            Notify::Signal => self.handles[SIGNAL],
            Notify::Broadcast => self.handles[BROADCAST],
        }
    }

    pub(crate) fn set(&self, which: Notify) {
        unsafe { SetEvent(self.handle(which)) };
    }

    pub(crate) fn reset(&self, which: Notify) {
        unsafe { ResetEvent(self.handle(which)) };
    }

    /// Blocks until either event is set or `timeout` elapses.
    ///
    /// `WAIT_FAILED` is reported as a timeout; the caller re-checks its
    /// predicate either way.
    pub(crate) fn wait_any(&self, timeout: Timeout) -> Wake {
        let rc = unsafe {
            WaitForMultipleObjects(
                self.handles.len() as u32,
                self.handles.as_ptr(),
                0,
                millis(timeout),
            )
        };

        if rc == WAIT_OBJECT_0 + SIGNAL as u32 {
            Wake::Signal
        } else if rc == WAIT_OBJECT_0 + BROADCAST as u32 {
            Wake::Broadcast
        } else {
            Wake::TimedOut
        }
    }
}

impl Drop for Events {
    fn drop(&mut self) {
        for handle in self.handles {
            unsafe { CloseHandle(handle) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_clamps_below_infinite() {
        assert_eq!(millis(Timeout::Infinite), INFINITE);
        assert_eq!(millis(Timeout::Millis(50)), 50);
        assert_eq!(millis(Timeout::Millis(INFINITE as u64)), INFINITE - 1);
        assert_eq!(millis(Timeout::Millis(u64::MAX)), INFINITE - 1);
    }

    #[test]
    fn test_raw_mutex_try_lock_fails_for_owner() {
        let mutex = RawMutex::new("Mutex::new").unwrap();

        mutex.lock();
        assert!(!mutex.try_lock(), "owner must not re-acquire the lock");
        unsafe { mutex.unlock() };

        assert!(mutex.try_lock());
        unsafe { mutex.unlock() };
    }

    #[test]
    fn test_signal_event_auto_resets() {
        let events = Events::new().unwrap();

        events.set(Notify::Signal);
        assert_eq!(events.wait_any(Timeout::Millis(0)), Wake::Signal);
        assert_eq!(events.wait_any(Timeout::Millis(0)), Wake::TimedOut);
    }

    #[test]
    fn test_broadcast_event_stays_set_until_reset() {
        let events = Events::new().unwrap();

        events.set(Notify::Broadcast);
        assert_eq!(events.wait_any(Timeout::Millis(0)), Wake::Broadcast);
        assert_eq!(events.wait_any(Timeout::Millis(0)), Wake::Broadcast);

        events.reset(Notify::Broadcast);
        assert_eq!(events.wait_any(Timeout::Millis(0)), Wake::TimedOut);
    }
}
