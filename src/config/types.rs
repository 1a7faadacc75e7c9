//! Configuration types and defaults for machine-lock.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the default store directory under the system temp dir.
pub const DEFAULT_STORE_DIR_NAME: &str = "machine-locks";

/// Who may release a claim.
///
/// `Permissive` lets any caller clear a claim, which is what teardown code
/// and lab operators rely on. `Strict` refuses releases from callers that are
/// not recorded as a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipPolicy {
    /// Any caller may release any claim (default).
    #[default]
    Permissive,
    /// Only a recorded holder may release its claim.
    Strict,
}

impl OwnershipPolicy {
    /// Parse an ownership policy from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

pub(super) fn default_store_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_STORE_DIR_NAME)
}

pub(super) fn default_true() -> bool {
    true
}

/// Parse a boolean-ish environment value.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
