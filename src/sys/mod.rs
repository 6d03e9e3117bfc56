//! Platform-specific synchronization primitives.
//!
//! This module provides a unified interface over the operating system's
//! locking and notification objects:
//! - `RawMutex`: `pthread_mutex_t` on Unix, an exclusive `SRWLOCK` on Windows,
//! - `Events`: the auto-reset/manual-reset event pair used by the emulated
//!   condition variable (Win32 event objects, or a pthread rendition),
//! - `RawCond`: the native `pthread_cond_t` (Unix only),
//! - `tick`: the monotonic millisecond clock.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

pub(crate) mod common;

pub use common::Timeout;
pub(crate) use common::{Notify, Wake};

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(windows)]
pub(crate) use windows as platform;

pub(crate) use platform::{Events, RawMutex, tick};

#[cfg(unix)]
pub(crate) use platform::RawCond;
