//! # nebula-sync
//!
//! **nebula-sync** provides a portable blocking [`Mutex`] and [`Condvar`] for
//! the **Nebula** ecosystem. Worker pools, timers and shared queues use it to
//! block, signal and coordinate threads without carrying platform-specific
//! code.
//!
//! The same API is backed by different operating-system objects:
//!
//! - on **Unix**, the mutex is a `pthread_mutex_t` and the condition variable
//!   a `pthread_cond_t` waiting against the monotonic clock,
//! - on **Windows**, the mutex is an exclusive `SRWLOCK` and the condition
//!   variable is emulated with an auto-reset event (signal), a manual-reset
//!   event (broadcast) and a waiter count.
//!
//! The emulation can be selected on Unix as well, either per instance with
//! [`Condvar::<Emulated>::with_backend`](Condvar::with_backend) or for the
//! whole build with the `emulated-condvar` feature.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_sync::{Condvar, Mutex};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new((Mutex::new(Vec::new()).unwrap(), Condvar::new().unwrap()));
//!
//! let producer = {
//!     let queue = queue.clone();
//!     thread::spawn(move || {
//!         let (items, ready) = &*queue;
//!         items.lock().push(7);
//!         ready.signal();
//!     })
//! };
//!
//! let (items, ready) = &*queue;
//! let mut guard = items.lock();
//! while guard.is_empty() {
//!     guard = ready.wait_ticks(guard, 1_000);
//! }
//! assert_eq!(guard.pop(), Some(7));
//! # drop(guard);
//! # producer.join().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`sync`] — Mutex and condition variable
//! - [`time`] — Monotonic tick and timeouts
//!
//! ## Logging
//!
//! Creation failures are reported through [`tracing`](https://docs.rs/tracing)
//! at `ERROR` level with `fatal = true` before being returned as
//! [`SyncError`]. No subscriber is installed by this crate.

mod error;
mod sys;
mod utils;

pub mod sync;
pub mod time;

pub use error::{Result, SyncError};
pub use sync::condvar::{Backend, DefaultBackend, Emulated};
#[cfg(unix)]
pub use sync::condvar::Native;
pub use sync::{Condvar, Mutex, MutexGuard};
pub use time::Timeout;
