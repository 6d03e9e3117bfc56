//! Synchronization primitives.
//!
//! This module provides the blocking primitives of the crate:
//! - [`Mutex`] — an OS-backed mutual exclusion lock guarding a value,
//! - [`Condvar`] — a condition variable paired with a [`Mutex`] per wait.
//!
//! ## Design notes
//!
//! - Every primitive owns its OS object in a dedicated heap allocation and
//!   releases it on drop; there is no explicit destroy call.
//! - Creation is the only fallible step and returns [`SyncError`](crate::SyncError).
//! - Primitives are safe to share between threads using `Arc`.

pub mod condvar;
mod mutex;

pub use condvar::Condvar;
pub use mutex::{Mutex, MutexGuard};
