//! Exit code constants for the machine-lock CLI.
//!
//! - 0: Success (claim granted, release done, query printed)
//! - 1: User error (bad args, bad resource name, invalid config)
//! - 2: Lock busy (claim denied under contention, or strict release refused)
//! - 3: Storage failure (store directory or record unusable)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid resource name, or invalid config.
pub const USER_ERROR: i32 = 1;

/// The requested claim could not be granted right now.
pub const LOCK_BUSY: i32 = 2;

/// The lock store could not be read or written.
pub const STORAGE_FAILURE: i32 = 3;
