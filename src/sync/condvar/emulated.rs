use super::{Backend, sealed};
use crate::error::Result;
use crate::sync::mutex::Mutex;
use crate::sys::{Events, Notify, RawMutex, Timeout};

use std::sync::atomic::{AtomicUsize, Ordering};

/// Condition variable emulated with two event objects.
///
/// - `signal` sets an auto-reset event: exactly one blocked waiter consumes
///   it and the event clears itself.
/// - `broadcast` sets a manual-reset event: every blocked waiter sees it,
///   and the last of them to leave `wait` resets it, so a later waiter never
///   picks up a stale broadcast.
///
/// Events are only set while at least one thread is inside `wait`, and both
/// are cleared when the last waiter leaves, so notifications are never
/// retained for future waiters.
pub struct Emulated {
    /// Number of threads currently inside `wait`.
    ///
    /// Only read or modified while `waiters_lock` is held.
    waiters: AtomicUsize,

    /// Serializes updates of `waiters` with setting and resetting events.
    waiters_lock: RawMutex,

    /// The signal (auto-reset) and broadcast (manual-reset) events.
    events: Events,
}

impl Emulated {
    /// Sets `which` if a thread is waiting.
    ///
    /// `waiters_lock` is only ever held for a counter update or an event
    /// set/reset, never across a blocking wait.
    fn notify(&self, which: Notify) {
        self.waiters_lock.lock();
        if self.waiters.load(Ordering::Acquire) > 0 {
            self.events.set(which);
        }
        unsafe { self.waiters_lock.unlock() };
    }

    #[cfg(test)]
    fn waiters(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }
}

impl sealed::Sealed for Emulated {}

impl Backend for Emulated {
    fn create() -> Result<Self> {
        Ok(Self {
            waiters: AtomicUsize::new(0),
            waiters_lock: RawMutex::new("Condvar::new")?,
            events: Events::new()?,
        })
    }

    unsafe fn wait<T: ?Sized>(&self, mutex: &Mutex<T>, timeout: Timeout) {
        self.waiters_lock.lock();
        self.waiters.fetch_add(1, Ordering::AcqRel);
        unsafe { self.waiters_lock.unlock() };

        // The count is raised before `mutex` is released, so a notifier that
        // takes `mutex` after us sets an event, and events keep their state
        // until a waiter observes them.
        unsafe { mutex.raw().unlock() };

        let wake = self.events.wait_any(timeout);

        self.waiters_lock.lock();
        let remaining = self.waiters.fetch_sub(1, Ordering::AcqRel) - 1;

        // Nobody is left to receive either event, whatever woke us: a
        // broadcast raced by a signal or a timeout would otherwise stay set.
        // Done under `waiters_lock`, so a waiter registering after this
        // point cannot have its own notification cleared by us.
        if remaining == 0 {
            self.events.reset(Notify::Broadcast);
            self.events.reset(Notify::Signal);
            tracing::trace!(target: "nebula_sync", ?wake, "last waiter reset events");
        }
        unsafe { self.waiters_lock.unlock() };

        mutex.raw().lock();
    }

    fn signal(&self) {
        self.notify(Notify::Signal);
    }

    fn broadcast(&self) {
        self.notify(Notify::Broadcast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::Wake;

    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Spins until `count` threads are registered as waiters.
    fn wait_for_waiters(backend: &Emulated, count: usize) {
        let start = Instant::now();
        while backend.waiters() < count {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "waiters never registered"
            );
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_waiter_count_returns_to_zero_after_timeout() {
        let backend = Emulated::create().unwrap();
        let mutex = Mutex::new(()).unwrap();

        let guard = mutex.lock();
        unsafe { backend.wait(&mutex, Timeout::Millis(10)) };
        drop(guard);

        assert_eq!(backend.waiters(), 0);
    }

    #[test]
    fn test_notifications_without_waiters_are_dropped() {
        let backend = Emulated::create().unwrap();

        backend.signal();
        backend.broadcast();

        assert_eq!(backend.events.wait_any(Timeout::Millis(0)), Wake::TimedOut);
    }

    #[test]
    fn test_last_broadcast_waiter_resets_event() {
        let shared = Arc::new((Emulated::create().unwrap(), Mutex::new(()).unwrap()));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let (backend, mutex) = &*shared;
                    let guard = mutex.lock();
                    unsafe { backend.wait(mutex, Timeout::Infinite) };
                    drop(guard);
                })
            })
            .collect();

        let (backend, _) = &*shared;
        wait_for_waiters(backend, 3);
        backend.broadcast();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(backend.waiters(), 0);
        assert_eq!(
            backend.events.wait_any(Timeout::Millis(0)),
            Wake::TimedOut,
            "broadcast event should be reset by the last waiter"
        );
    }

    #[test]
    fn test_mixed_wakes_leave_no_event_set() {
        for _ in 0..100 {
            let shared = Arc::new((Emulated::create().unwrap(), Mutex::new(()).unwrap()));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let shared = shared.clone();
                    thread::spawn(move || {
                        let (backend, mutex) = &*shared;
                        let guard = mutex.lock();
                        unsafe { backend.wait(mutex, Timeout::Millis(5_000)) };
                        drop(guard);
                    })
                })
                .collect();

            let (backend, mutex) = &*shared;
            wait_for_waiters(backend, 2);
            {
                let _guard = mutex.lock();
                backend.broadcast();
                backend.signal();
            }

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(backend.waiters(), 0);
            assert_eq!(
                backend.events.wait_any(Timeout::Millis(0)),
                Wake::TimedOut,
                "no event should outlive the last waiter"
            );
        }
    }

    #[test]
    fn test_timed_out_last_waiter_clears_broadcast() {
        let shared = Arc::new((Emulated::create().unwrap(), Mutex::new(()).unwrap()));

        let waiter = {
            let shared = shared.clone();
            thread::spawn(move || {
                let (backend, mutex) = &*shared;
                let guard = mutex.lock();
                unsafe { backend.wait(mutex, Timeout::Millis(20)) };
                drop(guard);
            })
        };

        let (backend, _) = &*shared;
        wait_for_waiters(backend, 1);

        // Hold the waiter past its timeout, then let a broadcast land
        // before it deregisters.
        backend.waiters_lock.lock();
        thread::sleep(Duration::from_millis(60));
        backend.events.set(Notify::Broadcast);
        unsafe { backend.waiters_lock.unlock() };

        waiter.join().unwrap();

        assert_eq!(backend.waiters(), 0);
        assert_eq!(
            backend.events.wait_any(Timeout::Millis(0)),
            Wake::TimedOut,
            "the last waiter should clear a broadcast it did not consume"
        );
    }
}
