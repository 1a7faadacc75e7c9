//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by every handle a process creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one record per resource. Every cooperating process
    /// must point at the same host-local directory.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Reclaim records whose holders have all exited.
    #[serde(default)]
    pub auto_reclaim: bool,

    /// Who may release a claim.
    #[serde(default)]
    pub ownership: OwnershipPolicy,

    /// Append lock/unlock/reclaim events to `<store_dir>/events.ndjson`.
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            auto_reclaim: false,
            ownership: OwnershipPolicy::default(),
            audit_log: default_true(),
        }
    }
}
