//! Unix platform layer.
//!
//! Thin wrappers over `pthread_mutex_t` and `pthread_cond_t`, the clock used
//! for deadlines, and a pthread-based event pair giving the condition
//! variable emulation the same auto/manual-reset semantics it has on
//! Windows.
//!
//! Every primitive lives in its own heap allocation: POSIX forbids moving an
//! initialized mutex or condition variable, while the Rust handles that own
//! them are free to move.

use crate::error::{Result, SyncError};
use crate::sys::common::{Notify, Timeout, Wake};
use crate::utils::{alloc, report};

use libc::{
    CLOCK_MONOTONIC, ETIMEDOUT, PTHREAD_MUTEX_NORMAL, c_long, clock_gettime, clockid_t,
    pthread_cond_broadcast, pthread_cond_destroy, pthread_cond_init, pthread_cond_signal,
    pthread_cond_t, pthread_cond_timedwait, pthread_cond_wait, pthread_condattr_destroy,
    pthread_condattr_init, pthread_condattr_t, pthread_mutex_destroy, pthread_mutex_init,
    pthread_mutex_lock, pthread_mutex_t, pthread_mutex_trylock, pthread_mutex_unlock,
    pthread_mutexattr_destroy, pthread_mutexattr_init, pthread_mutexattr_settype,
    pthread_mutexattr_t, time_t, timespec,
};
use std::cell::UnsafeCell;
use std::io;
use std::mem::{self, MaybeUninit};

/// Clock the condition variables measure their deadlines against.
///
/// Apple targets lack `pthread_condattr_setclock`, so their condition
/// variables stay on the realtime clock.
#[cfg(not(target_vendor = "apple"))]
const COND_CLOCK: clockid_t = CLOCK_MONOTONIC;

#[cfg(target_vendor = "apple")]
const COND_CLOCK: clockid_t = libc::CLOCK_REALTIME;

/// Reads `clock` as a `timespec`.
fn clock_now(clock: clockid_t) -> timespec {
    let mut now: timespec = unsafe { mem::zeroed() };
    let rc = unsafe { clock_gettime(clock, &mut now) };
    debug_assert_eq!(rc, 0, "clock_gettime failed");
    now
}

/// Current monotonic time in milliseconds.
pub(crate) fn tick() -> u64 {
    let now = clock_now(CLOCK_MONOTONIC);

    (now.tv_sec as u64)
        .saturating_mul(1000)
        .saturating_add(now.tv_nsec as u64 / 1_000_000)
}

/// Converts a relative timeout in milliseconds into an absolute deadline on
/// [`COND_CLOCK`].
fn deadline(millis: u64) -> timespec {
    let now = clock_now(COND_CLOCK);

    let mut secs = (now.tv_sec as u64).saturating_add(millis / 1000);
    let mut nanos = now.tv_nsec as u64 + (millis % 1000) * 1_000_000;
    if nanos >= 1_000_000_000 {
        secs = secs.saturating_add(1);
        nanos -= 1_000_000_000;
    }

    let mut at: timespec = unsafe { mem::zeroed() };
    at.tv_sec = time_t::try_from(secs).unwrap_or(time_t::MAX);
    at.tv_nsec = nanos as c_long;
    at
}

/// Builds the error returned when a `pthread_*_init` call fails.
fn init_error(what: &'static str, rc: i32) -> SyncError {
    SyncError::Init {
        what,
        source: io::Error::from_raw_os_error(rc),
    }
}

/// A `PTHREAD_MUTEX_NORMAL` mutex: relocking from the owning thread
/// deadlocks and `try_lock` from it fails.
pub struct RawMutex {
    inner: Box<UnsafeCell<pthread_mutex_t>>,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    /// Allocates and initializes a mutex.
    ///
    /// `what` names the public primitive being built, for error reports.
    pub(crate) fn new(what: &'static str) -> Result<Self> {
        let inner: Box<UnsafeCell<pthread_mutex_t>> = unsafe { alloc::zeroed_box(what)? };

        let mut attr = MaybeUninit::<pthread_mutexattr_t>::uninit();
        let rc = unsafe { pthread_mutexattr_init(attr.as_mut_ptr()) };
        if rc != 0 {
            return report::fail(init_error(what, rc));
        }

        let rc = unsafe { pthread_mutexattr_settype(attr.as_mut_ptr(), PTHREAD_MUTEX_NORMAL) };
        if rc != 0 {
            unsafe { pthread_mutexattr_destroy(attr.as_mut_ptr()) };
            return report::fail(init_error(what, rc));
        }

        let rc = unsafe { pthread_mutex_init(inner.get(), attr.as_ptr()) };
        unsafe { pthread_mutexattr_destroy(attr.as_mut_ptr()) };
        if rc != 0 {
            return report::fail(init_error(what, rc));
        }

        Ok(Self { inner })
    }

    pub(crate) fn lock(&self) {
        let rc = unsafe { pthread_mutex_lock(self.inner.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_lock failed");
    }

    pub(crate) fn try_lock(&self) -> bool {
        unsafe { pthread_mutex_trylock(self.inner.get()) == 0 }
    }

    /// # Safety
    ///
    /// The calling thread must hold the lock.
    pub(crate) unsafe fn unlock(&self) {
        let rc = unsafe { pthread_mutex_unlock(self.inner.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_unlock failed");
    }

    pub(crate) fn as_ptr(&self) -> *mut pthread_mutex_t {
        self.inner.get()
    }
}

impl Drop for RawMutex {
    fn drop(&mut self) {
        unsafe { pthread_mutex_destroy(self.inner.get()) };
    }
}

/// A `pthread_cond_t` bound to [`COND_CLOCK`].
pub struct RawCond {
    inner: Box<UnsafeCell<pthread_cond_t>>,
}

unsafe impl Send for RawCond {}
unsafe impl Sync for RawCond {}

impl RawCond {
    pub(crate) fn new(what: &'static str) -> Result<Self> {
        let inner: Box<UnsafeCell<pthread_cond_t>> = unsafe { alloc::zeroed_box(what)? };

        let mut attr = MaybeUninit::<pthread_condattr_t>::uninit();
        let rc = unsafe { pthread_condattr_init(attr.as_mut_ptr()) };
        if rc != 0 {
            return report::fail(init_error(what, rc));
        }

        #[cfg(not(target_vendor = "apple"))]
        {
            let rc = unsafe { libc::pthread_condattr_setclock(attr.as_mut_ptr(), COND_CLOCK) };
            if rc != 0 {
                unsafe { pthread_condattr_destroy(attr.as_mut_ptr()) };
                return report::fail(init_error(what, rc));
            }
        }

        let rc = unsafe { pthread_cond_init(inner.get(), attr.as_ptr()) };
        unsafe { pthread_condattr_destroy(attr.as_mut_ptr()) };
        if rc != 0 {
            return report::fail(init_error(what, rc));
        }

        Ok(Self { inner })
    }

    /// Releases `mutex`, blocks for at most `timeout`, then re-acquires it.
    ///
    /// # Safety
    ///
    /// The calling thread must hold `mutex`.
    pub(crate) unsafe fn wait(&self, mutex: &RawMutex, timeout: Timeout) {
        match timeout {
            Timeout::Infinite => unsafe {
                self.wait_until(mutex, None);
            },
            Timeout::Millis(millis) => unsafe {
                self.wait_until(mutex, Some(&deadline(millis)));
            },
        }
    }

    /// Waits until notified or until the absolute `deadline` passes.
    ///
    /// Returns `true` if the deadline passed.
    ///
    /// # Safety
    ///
    /// The calling thread must hold `mutex`.
    unsafe fn wait_until(&self, mutex: &RawMutex, deadline: Option<&timespec>) -> bool {
        match deadline {
            None => {
                unsafe { pthread_cond_wait(self.inner.get(), mutex.as_ptr()) };
                false
            }
            Some(at) => {
                let rc = unsafe { pthread_cond_timedwait(self.inner.get(), mutex.as_ptr(), at) };
                rc == ETIMEDOUT
            }
        }
    }

    pub(crate) fn signal(&self) {
        unsafe { pthread_cond_signal(self.inner.get()) };
    }

    pub(crate) fn broadcast(&self) {
        unsafe { pthread_cond_broadcast(self.inner.get()) };
    }
}

impl Drop for RawCond {
    fn drop(&mut self) {
        unsafe { pthread_cond_destroy(self.inner.get()) };
    }
}

/// Signaled state of the two events, guarded by `Events::lock`.
#[derive(Default)]
struct EventState {
    signal: bool,
    broadcast: bool,
}

/// An auto-reset "signal" event and a manual-reset "broadcast" event that
/// can be waited on together.
///
/// Behaves like a pair of Win32 event objects passed to
/// `WaitForMultipleObjects`: the signal event is consumed by the waiter that
/// observes it, the broadcast event stays set until [`reset`](Self::reset),
/// and the signal event wins when both are set.
pub struct Events {
    lock: RawMutex,
    cond: RawCond,
    state: UnsafeCell<EventState>,
}

unsafe impl Send for Events {}
unsafe impl Sync for Events {}

impl Events {
    /// Creates both events in the unsignaled state.
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            lock: RawMutex::new("Condvar::new")?,
            cond: RawCond::new("Condvar::new")?,
            state: UnsafeCell::new(EventState::default()),
        })
    }

    pub(crate) fn set(&self, which: Notify) {
        self.lock.lock();

        let state = unsafe { &mut *self.state.get() };
        match which {
            Notify::Signal => state.signal = true,
            Notify::Broadcast => state.broadcast = true,
        }

        // Any waiter may be the one to consume the signal event.
        self.cond.broadcast();
        unsafe { self.lock.unlock() };
    }

    pub(crate) fn reset(&self, which: Notify) {
        self.lock.lock();

        let state = unsafe { &mut *self.state.get() };
        match which {
            Notify::Signal => state.signal = false,
            Notify::Broadcast => state.broadcast = false,
        }

        unsafe { self.lock.unlock() };
    }

    /// Blocks until either event is set or `timeout` elapses.
    pub(crate) fn wait_any(&self, timeout: Timeout) -> Wake {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Millis(millis) => Some(deadline(millis)),
        };

        self.lock.lock();

        let mut timed_out = false;
        let wake = loop {
            let state = unsafe { &mut *self.state.get() };

            if state.signal {
                state.signal = false;
                break Wake::Signal;
            }

            if state.broadcast {
                break Wake::Broadcast;
            }

            if timed_out {
                break Wake::TimedOut;
            }

            timed_out = unsafe { self.cond.wait_until(&self.lock, deadline.as_ref()) };
        };

        unsafe { self.lock.unlock() };
        wake
    }
}
