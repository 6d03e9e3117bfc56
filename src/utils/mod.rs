//! Internal helpers shared by the primitives.
//!
//! - [`alloc`] provides failure-detectable, zeroed allocation for OS structs
//!   that must never move once initialized.
//! - [`report`] forwards unrecoverable creation failures to `tracing`.

pub(crate) mod alloc;
pub(crate) mod report;
