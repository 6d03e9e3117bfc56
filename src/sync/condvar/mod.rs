//! Condition variables.
//!
//! [`Condvar`] is a thin front over a [`Backend`] strategy chosen at compile
//! time:
//!
//! - [`Native`] delegates to `pthread_cond_t` (Unix),
//! - [`Emulated`] builds a condition variable out of an auto-reset and a
//!   manual-reset event plus a waiter count (always used on Windows, and on
//!   Unix with the `emulated-condvar` feature).
//!
//! Both strategies share the same contract: `wait` releases the mutex,
//! blocks until notified or timed out, and re-acquires the mutex before
//! returning. Neither reports why it woke up; callers re-check their
//! predicate under the mutex.

mod emulated;
#[cfg(unix)]
mod native;

pub use emulated::Emulated;
#[cfg(unix)]
pub use native::Native;

use crate::error::Result;
use crate::sync::mutex::{Mutex, MutexGuard};
use crate::sys::Timeout;

use std::fmt;
use std::time::Duration;

/// Strategy used by [`Condvar`] when no backend is named explicitly.
#[cfg(all(unix, not(feature = "emulated-condvar")))]
pub type DefaultBackend = Native;

/// Strategy used by [`Condvar`] when no backend is named explicitly.
#[cfg(any(windows, feature = "emulated-condvar"))]
pub type DefaultBackend = Emulated;

mod sealed {
    pub trait Sealed {}
}

/// A condition-variable implementation strategy.
///
/// This trait is sealed: the available strategies are [`Native`] (Unix only)
/// and [`Emulated`].
pub trait Backend: sealed::Sealed + Send + Sync + Sized {
    #[doc(hidden)]
    fn create() -> Result<Self>;

    /// # Safety
    ///
    /// The calling thread must hold `mutex`.
    #[doc(hidden)]
    unsafe fn wait<T: ?Sized>(&self, mutex: &Mutex<T>, timeout: Timeout);

    #[doc(hidden)]
    fn signal(&self);

    #[doc(hidden)]
    fn broadcast(&self);
}

/// A condition variable.
///
/// A `Condvar` lets threads block until another thread changes some shared
/// state guarded by a [`Mutex`]. It is not tied to a particular mutex: the
/// pairing only lasts for one call to [`wait`](Self::wait).
///
/// Wake-ups may be spurious and carry no reason, so waits belong in a loop
/// that re-checks the predicate.
///
/// # Examples
///
/// ```rust
/// use nebula_sync::{Condvar, Mutex};
/// use std::sync::Arc;
/// use std::thread;
///
/// let pair = Arc::new((Mutex::new(false).unwrap(), Condvar::new().unwrap()));
/// let pair2 = pair.clone();
///
/// thread::spawn(move || {
///     let (lock, cvar) = &*pair2;
///     *lock.lock() = true;
///     cvar.signal();
/// });
///
/// let (lock, cvar) = &*pair;
/// let mut ready = lock.lock();
/// while !*ready {
///     ready = cvar.wait(ready);
/// }
/// ```
pub struct Condvar<B: Backend = DefaultBackend> {
    backend: B,
}

impl Condvar {
    /// Creates a condition variable using the [`DefaultBackend`].
    ///
    /// # Errors
    ///
    /// Fails if storage or OS objects for the condition variable cannot be
    /// allocated. The failure is also reported through `tracing` as a fatal
    /// event.
    pub fn new() -> Result<Condvar> {
        Self::with_backend()
    }
}

impl<B: Backend> Condvar<B> {
    /// Creates a condition variable using the strategy `B`.
    ///
    /// ```rust
    /// use nebula_sync::{Condvar, Emulated};
    ///
    /// let cvar = Condvar::<Emulated>::with_backend().unwrap();
    /// cvar.broadcast();
    /// ```
    pub fn with_backend() -> Result<Self> {
        let backend = B::create()?;
        tracing::trace!(target: "nebula_sync", backend = std::any::type_name::<B>(), "condvar created");

        Ok(Self { backend })
    }

    /// Blocks until this condition variable is notified.
    ///
    /// The mutex behind `guard` is released while blocked and re-acquired
    /// before returning.
    pub fn wait<'a, T: ?Sized>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.wait_for(guard, Timeout::Infinite)
    }

    /// Like [`wait`](Self::wait), but gives up after `duration`.
    pub fn wait_timeout<'a, T: ?Sized>(
        &self,
        guard: MutexGuard<'a, T>,
        duration: Duration,
    ) -> MutexGuard<'a, T> {
        self.wait_for(guard, Timeout::from(duration))
    }

    /// Like [`wait`](Self::wait), with the timeout given in milliseconds.
    ///
    /// A negative `timeout_ticks` waits without limit.
    pub fn wait_ticks<'a, T: ?Sized>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout_ticks: i64,
    ) -> MutexGuard<'a, T> {
        self.wait_for(guard, Timeout::from_ticks(timeout_ticks))
    }

    /// Blocks until notified or until `timeout` elapses, whichever comes
    /// first, then re-acquires the mutex.
    ///
    /// A timed-out wait returns exactly like a notified one.
    pub fn wait_for<'a, T: ?Sized>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Timeout,
    ) -> MutexGuard<'a, T> {
        // The guard proves this thread holds the mutex; it stays alive so
        // the lock is owned again once the backend returns.
        unsafe { self.backend.wait(guard.mutex(), timeout) };
        guard
    }

    /// Wakes at most one thread blocked on this condition variable.
    ///
    /// Nothing is remembered if no thread is waiting. Never blocks.
    pub fn signal(&self) {
        self.backend.signal();
    }

    /// Wakes every thread currently blocked on this condition variable.
    ///
    /// Never blocks.
    pub fn broadcast(&self) {
        self.backend.broadcast();
    }
}

impl<B: Backend> fmt::Debug for Condvar<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar")
            .field("backend", &std::any::type_name::<B>())
            .finish_non_exhaustive()
    }
}
