//! Filesystem utilities for the lock store.
//!
//! Lock records are only ever replaced whole, through [`atomic_write`], so a
//! crash mid-write leaves either the previous record or the new one.

pub mod atomic;

pub use atomic::atomic_write;
