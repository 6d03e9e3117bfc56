//! Error types returned when a primitive cannot be created.
//!
//! Creation is the only fallible step: once a [`Mutex`](crate::Mutex) or
//! [`Condvar`](crate::Condvar) exists, locking, waiting and notifying have no
//! recoverable error path.

use std::io;
use thiserror::Error;

/// Errors raised while creating a synchronization primitive.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The allocator could not provide storage for the primitive.
    #[error("{what}: out of memory while allocating {size} bytes")]
    OutOfMemory {
        /// The primitive being created.
        what: &'static str,
        /// Number of bytes requested.
        size: usize,
    },

    /// The operating system refused to initialize the primitive.
    #[error("{what}: initialization failed: {source}")]
    Init {
        /// The primitive being created.
        what: &'static str,
        /// The OS error reported by the failing call.
        #[source]
        source: io::Error,
    },
}

/// Result alias used by every constructor in this crate.
pub type Result<T> = std::result::Result<T, SyncError>;
