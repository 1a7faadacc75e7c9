//! Lock modes and the on-disk lock record.

use super::holder::Holder;
use crate::error::{MachineLockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a lock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Nobody holds the resource.
    #[default]
    Unlocked,
    /// One or more shared holders.
    Shared,
    /// Exactly one exclusive holder.
    Exclusive,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Unlocked => "unlocked",
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    Shared,
    Exclusive,
}

impl ClaimMode {
    pub fn from_exclusive(exclusive: bool) -> Self {
        if exclusive {
            ClaimMode::Exclusive
        } else {
            ClaimMode::Shared
        }
    }

    /// Record mode that a granted claim of this kind produces.
    pub fn lock_mode(&self) -> LockMode {
        match self {
            ClaimMode::Shared => LockMode::Shared,
            ClaimMode::Exclusive => LockMode::Exclusive,
        }
    }
}

/// Persistent state of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Resource name as given by the caller (before sanitizing).
    pub resource: String,

    /// Current mode.
    #[serde(default)]
    pub mode: LockMode,

    /// Recorded claimants, oldest first.
    #[serde(default)]
    pub holders: Vec<Holder>,

    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

impl LockRecord {
    /// A fresh, unlocked record.
    pub fn unlocked(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            mode: LockMode::Unlocked,
            holders: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.mode == LockMode::Unlocked
    }

    /// Drop every holder and return to `Unlocked`.
    pub(crate) fn clear(&mut self) {
        self.mode = LockMode::Unlocked;
        self.holders.clear();
    }

    /// Check the mode/holder-count invariants.
    ///
    /// exclusive ⇒ exactly one holder, shared ⇒ at least one, unlocked ⇒ none.
    pub fn validate(&self) -> Result<()> {
        let count = self.holders.len();
        let ok = match self.mode {
            LockMode::Unlocked => count == 0,
            LockMode::Shared => count >= 1,
            LockMode::Exclusive => count == 1,
        };

        if ok {
            Ok(())
        } else {
            Err(MachineLockError::CorruptRecord(format!(
                "record for '{}' is {} with {} holder(s)",
                self.resource, self.mode, count
            )))
        }
    }
}

impl std::fmt::Display for LockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.resource, self.mode)?;
        if !self.holders.is_empty() {
            let holders: Vec<String> = self
                .holders
                .iter()
                .map(|h| format!("{} pid {} for {}", h.owner, h.pid, h.age_string()))
                .collect();
            write!(f, ", holders: {}", holders.join("; "))?;
        }
        write!(f, ")")
    }
}
