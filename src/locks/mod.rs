//! Machine locks: shared/exclusive claims on named resources.
//!
//! Independently launched processes on one host coordinate through a store
//! directory holding one record per resource. There is no daemon and no
//! background thread; every [`MachineLock::lock`] and [`MachineLock::unlock`]
//! call is a single read-modify-write of the record, serialized by an OS
//! advisory lock on a per-record mutex file.
//!
//! # Record
//!
//! Each record is JSON:
//! - `resource`: the resource name as given by the caller
//! - `mode`: `unlocked`, `shared`, or `exclusive`
//! - `holders`: pid, `user@HOST` owner, host, handle token, and claim time
//! - `updated_at`: RFC3339 timestamp of the last write
//!
//! # Semantics
//!
//! - `lock` never waits: it returns `Ok(false)` under contention.
//! - An exclusive claim excludes every other claim; shared claims stack.
//! - `unlock` is idempotent and, under the default permissive policy, not
//!   ownership-checked, so teardown code and operators can always clear a
//!   claim.
//! - With auto-reclaim, a record whose holders have all exited is treated as
//!   unlocked on the next `lock`. Holders whose liveness cannot be determined
//!   count as alive.

mod guard;
mod handle;
pub mod holder;
pub mod liveness;
mod store;
mod types;


// Re-export public API
pub use guard::ClaimGuard;
pub use handle::MachineLock;
pub use holder::Holder;
pub use liveness::Liveness;
pub use store::{LockStore, RECORD_EXTENSION, RecordTxn, sanitize_resource_name};
pub use types::{ClaimMode, LockMode, LockRecord};
