use crate::error::Result;
use crate::sys::RawMutex;

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A blocking mutual exclusion primitive.
///
/// `Mutex<T>` wraps the platform's exclusive lock (`pthread_mutex_t` on
/// Unix, an exclusive `SRWLOCK` on Windows) together with the value it guards.
/// Threads that cannot acquire the lock are blocked by the OS until it
/// becomes available.
///
/// The lock is released when the [`MutexGuard`] returned by
/// [`lock`](Self::lock) or [`try_lock`](Self::try_lock) goes out of scope,
/// on every exit path. Use `Mutex<()>` when only the lock is needed.
///
/// There is no poisoning: a panic while the guard is alive unlocks the
/// mutex and leaves the value as it was.
pub struct Mutex<T: ?Sized> {
    /// The platform lock.
    ///
    /// Heap-allocated by the platform layer so the `Mutex` itself can move.
    raw: RawMutex,

    /// The value protected by the lock.
    data: UnsafeCell<T>,
}

// Safety: the lock hands out at most one guard at a time, so sharing the
// mutex only ever gives one thread access to `T`.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates a new, unlocked mutex wrapping `value`.
    ///
    /// # Errors
    ///
    /// Fails if storage for the lock cannot be allocated or the OS refuses
    /// to initialize it. The failure is also reported through `tracing` as
    /// a fatal event.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nebula_sync::Mutex;
    ///
    /// let mutex = Mutex::new(42).unwrap();
    /// assert_eq!(*mutex.lock(), 42);
    /// ```
    pub fn new(value: T) -> Result<Mutex<T>> {
        let raw = RawMutex::new("Mutex::new")?;
        tracing::trace!(target: "nebula_sync", "mutex created");

        Ok(Self {
            raw,
            data: UnsafeCell::new(value),
        })
    }

    /// Consumes the mutex and returns the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Blocks the current thread until the lock is acquired.
    ///
    /// Locking a mutex the current thread already holds deadlocks; the lock
    /// is never re-entrant.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.lock();
        MutexGuard::new(self)
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `None` if the lock is held, including by the calling thread.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(MutexGuard::new(self))
        } else {
            None
        }
    }

    /// Returns a mutable reference to the value without locking.
    ///
    /// The exclusive borrow proves no guard is alive.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub(crate) fn raw(&self) -> &RawMutex {
        &self.raw
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

/// Guard returned by [`Mutex::lock`] and [`Mutex::try_lock`].
///
/// Releases the mutex when dropped. The guard cannot be sent to another
/// thread: the lock must be released by the thread that acquired it.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
    _not_send: PhantomData<*const ()>,
}

// Safety: a shared guard only exposes `&T`.
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<'a, T: ?Sized> MutexGuard<'a, T> {
    fn new(mutex: &'a Mutex<T>) -> Self {
        Self {
            mutex,
            _not_send: PhantomData,
        }
    }

    /// Releases the lock explicitly.
    ///
    /// Equivalent to dropping the guard.
    pub fn unlock(guard: Self) {
        drop(guard);
    }

    pub(crate) fn mutex(&self) -> &'a Mutex<T> {
        self.mutex
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        // The guard exists only while this thread holds the lock.
        unsafe { self.mutex.raw.unlock() };
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
