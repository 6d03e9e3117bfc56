//! Time utilities.
//!
//! This module exposes the monotonic millisecond tick the crate uses to turn
//! relative timeouts into deadlines, and the [`Timeout`] type accepted by the
//! condition variable.

#[doc(inline)]
pub use crate::sys::Timeout;

/// Returns the current value of the monotonic clock, in milliseconds.
///
/// The origin is unspecified (boot time on most platforms); only
/// differences between two ticks are meaningful. The clock never goes
/// backwards and is not affected by wall-clock adjustments.
///
/// # Examples
///
/// ```rust
/// let start = nebula_sync::time::tick();
/// let end = nebula_sync::time::tick();
/// assert!(end >= start);
/// ```
pub fn tick() -> u64 {
    crate::sys::tick()
}
