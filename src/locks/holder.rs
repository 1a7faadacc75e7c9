//! Holder identities recorded in lock records.

use super::liveness::{current_boot_id, process_start_ticks};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One recorded claimant of a lock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// Process whose lifetime the claim is tied to.
    pub pid: u32,

    /// Human-readable owner (`user@HOST`).
    pub owner: String,

    /// Host the claim was made on. Liveness can only be judged locally.
    pub host: String,

    /// Identity of the handle that made the claim.
    pub token: String,

    /// When the claim was granted. Display only; never used for liveness.
    pub claimed_at: DateTime<Utc>,

    /// Start time of `pid` in clock ticks since boot, when it could be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ticks: Option<u64>,

    /// Kernel boot id at claim time, when it could be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_id: Option<String>,
}

impl Holder {
    /// Create a holder for `pid` and handle `token`, stamped now.
    pub fn new(pid: u32, token: &str) -> Self {
        Self {
            pid,
            owner: get_owner_string(),
            host: get_host_string(),
            token: token.to_string(),
            claimed_at: Utc::now(),
            start_ticks: process_start_ticks(pid),
            boot_id: current_boot_id(),
        }
    }

    /// How long the claim has been held.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.claimed_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

/// `user@HOST` for the current process.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, get_host_string())
}

/// Local hostname, or `unknown`.
pub(crate) fn get_host_string() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
