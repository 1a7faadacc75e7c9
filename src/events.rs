//! Audit log for lock state changes.
//!
//! Each granted claim, release, and auto-reclaim is appended as one JSON
//! object per line to `<store_dir>/events.ndjson`:
//! - `ts`: RFC3339 timestamp
//! - `action`: `lock`, `unlock`, or `reclaim`
//! - `actor`: the owner string (`user@HOST`)
//! - `resource`: the resource name as given by the caller
//! - `details`: action-specific object (mode, pid, holders left, ...)
//!
//! Events are appended while the record mutex is held, so for a single
//! resource the log order matches the order of state changes.

use crate::error::{MachineLockError, Result};
use crate::locks::holder::get_owner_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the audit log inside the store directory.
pub const EVENTS_FILE_NAME: &str = "events.ndjson";

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A claim was granted.
    Lock,
    /// A claim was released (possibly by a non-holder).
    Unlock,
    /// A record whose holders had all exited was reset to unlocked.
    Reclaim,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Lock => write!(f, "lock"),
            EventAction::Unlock => write!(f, "unlock"),
            EventAction::Reclaim => write!(f, "reclaim"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Resource the action applied to.
    pub resource: String,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event for `resource`, stamped now.
    pub fn new(action: EventAction, resource: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_owner_string(),
            resource: resource.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            MachineLockError::StorageError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the path to the events file for a store directory.
pub fn events_file_path(store_dir: &Path) -> PathBuf {
    store_dir.join(EVENTS_FILE_NAME)
}

/// Append an event to the store's audit log, creating the file if needed.
pub fn append_event(store_dir: &Path, event: &Event) -> Result<()> {
    let events_file = events_file_path(store_dir);
    let json_line = event.to_ndjson_line()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            MachineLockError::StorageError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        MachineLockError::StorageError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read all events from the audit log. A missing log yields no events.
pub fn read_events(store_dir: &Path) -> Result<Vec<Event>> {
    let events_file = events_file_path(store_dir);
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&events_file).map_err(|e| {
        MachineLockError::StorageError(format!(
            "failed to read events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                MachineLockError::CorruptRecord(format!(
                    "invalid event line in '{}': {}",
                    events_file.display(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Lock, "dut-1");

        assert_eq!(event.action, EventAction::Lock);
        assert_eq!(event.resource, "dut-1");
        assert!(event.actor.contains('@'));
        assert!(event.details.is_object());
    }

    #[test]
    fn test_event_ndjson_is_single_line() {
        let event = Event::new(EventAction::Reclaim, "dut-1")
            .with_details(json!({"dead_holders": [1234, 5678]}));
        let line = event.to_ndjson_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("\"action\":\"reclaim\""));
        assert!(line.contains("dead_holders"));
    }

    #[test]
    fn test_event_action_display() {
        assert_eq!(EventAction::Lock.to_string(), "lock");
        assert_eq!(EventAction::Unlock.to_string(), "unlock");
        assert_eq!(EventAction::Reclaim.to_string(), "reclaim");
    }

    #[test]
    fn test_append_and_read_events() {
        let temp_dir = TempDir::new().unwrap();

        append_event(
            temp_dir.path(),
            &Event::new(EventAction::Lock, "dut-1").with_details(json!({"mode": "exclusive"})),
        )
        .unwrap();
        append_event(temp_dir.path(), &Event::new(EventAction::Unlock, "dut-1")).unwrap();

        let events = read_events(temp_dir.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::Lock);
        assert_eq!(events[0].details["mode"], "exclusive");
        assert_eq!(events[1].action, EventAction::Unlock);
    }

    #[test]
    fn test_read_events_missing_log_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_events(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_append_to_missing_dir_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let err = append_event(&missing, &Event::new(EventAction::Lock, "dut-1")).unwrap_err();
        assert!(matches!(err, MachineLockError::StorageError(_)));
    }
}
