use super::{Backend, sealed};
use crate::error::Result;
use crate::sync::mutex::Mutex;
use crate::sys::{RawCond, Timeout};

/// Pass-through to the platform's `pthread_cond_t`.
///
/// Timed waits are turned into an absolute deadline on the monotonic clock
/// (realtime on Apple targets).
pub struct Native {
    cond: RawCond,
}

impl sealed::Sealed for Native {}

impl Backend for Native {
    fn create() -> Result<Self> {
        Ok(Self {
            cond: RawCond::new("Condvar::new")?,
        })
    }

    unsafe fn wait<T: ?Sized>(&self, mutex: &Mutex<T>, timeout: Timeout) {
        unsafe { self.cond.wait(mutex.raw(), timeout) };
    }

    fn signal(&self) {
        self.cond.signal();
    }

    fn broadcast(&self) {
        self.cond.broadcast();
    }
}
