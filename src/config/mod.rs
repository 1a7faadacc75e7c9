//! Configuration model for machine-lock.
//!
//! A config file is optional YAML. Unknown keys are ignored for forward
//! compatibility, every field has a default, and two environment variables
//! (`MACHINE_LOCK_DIR`, `MACHINE_LOCK_AUTO_RECLAIM`) override the file so
//! test harnesses can point a whole run at a different store.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use operations::{ENV_AUTO_RECLAIM, ENV_STORE_DIR};
pub use types::OwnershipPolicy;
