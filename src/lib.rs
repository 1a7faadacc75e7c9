//! machine-lock: host-local shared/exclusive locks on named test machines.
//!
//! Independently launched test runners claim a machine before using it and
//! release it afterwards. Claims live in a shared directory, one record per
//! machine, so no daemon is needed and a crashed runner can be detected from
//! any other process on the host.
//!
//! ```no_run
//! use machine_lock::locks::MachineLock;
//!
//! let lock = MachineLock::new("dut-1", "/var/lock/machines")?.with_auto_reclaim(true);
//! if lock.lock(true)? {
//!     // ... run tests against dut-1 ...
//!     lock.unlock(true)?;
//! }
//! # Ok::<(), machine_lock::error::MachineLockError>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod locks;

pub use config::{Config, OwnershipPolicy};
pub use error::{MachineLockError, Result};
pub use locks::{ClaimGuard, LockMode, LockRecord, MachineLock};
