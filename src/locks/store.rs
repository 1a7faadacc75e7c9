//! The lock store: one JSON record per resource in a shared directory.
//!
//! # Files
//!
//! For a resource whose sanitized key is `dut-1`:
//! - `dut-1.lock`: the record (mode + holders), replaced atomically
//! - `dut-1.lock.mutex`: target of the OS advisory lock that serializes
//!   read-modify-write cycles; never rewritten, so the lock always lands on
//!   the same inode
//! - `.dut-1.lock.tmp`: transient, only while a write is in progress
//!
//! The advisory lock is held only for the duration of one [`RecordTxn`]. It is
//! separate from the logical shared/exclusive state stored in the record.
//! Advisory locks are host-local, so the store must live on local storage.

use super::types::LockRecord;
use crate::error::{MachineLockError, Result};
use crate::fs::atomic_write;
use chrono::Utc;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of record files.
pub const RECORD_EXTENSION: &str = "lock";

const MUTEX_SUFFIX: &str = "mutex";

/// Longest accepted key, leaving room for the file suffixes.
const MAX_KEY_LEN: usize = 200;

/// Turn a resource name into a key that is safe as a file name.
///
/// ASCII letters, digits, `-`, `_` and `.` are kept; everything else becomes
/// `_`, as does a leading `.` (hidden files are reserved for temporaries).
pub fn sanitize_resource_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MachineLockError::UserError(
            "resource name must not be empty".to_string(),
        ));
    }

    let mut key: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if key.starts_with('.') {
        key.replace_range(0..1, "_");
    }

    if key.len() > MAX_KEY_LEN {
        return Err(MachineLockError::UserError(format!(
            "resource name is too long ({} bytes, max {})",
            key.len(),
            MAX_KEY_LEN
        )));
    }

    Ok(key)
}

/// Handle on a store directory.
#[derive(Debug, Clone)]
pub struct LockStore {
    dir: PathBuf,
}

impl LockStore {
    /// Open a store, creating its directory if it does not exist yet.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            MachineLockError::StorageError(format!(
                "failed to create lock store '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `name`.
    pub fn record_path(&self, name: &str) -> Result<PathBuf> {
        let key = sanitize_resource_name(name)?;
        Ok(self.record_path_for_key(&key))
    }

    fn record_path_for_key(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    fn mutex_path_for_key(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}", key, RECORD_EXTENSION, MUTEX_SUFFIX))
    }

    /// Start a read-modify-write cycle on the record for `name`.
    ///
    /// Blocks only while another process is inside its own cycle on the same
    /// record, which never spans more than one read and one write.
    pub fn begin(&self, name: &str) -> Result<RecordTxn> {
        let key = sanitize_resource_name(name)?;
        let mutex = self.open_mutex(&key)?;
        mutex.lock_exclusive().map_err(|e| {
            MachineLockError::StorageError(format!(
                "failed to lock record mutex for '{}': {}",
                name, e
            ))
        })?;

        let path = self.record_path_for_key(&key);
        let stored = read_record_file(&path)?;
        let record = stored
            .clone()
            .unwrap_or_else(|| LockRecord::unlocked(name));

        Ok(RecordTxn {
            path,
            record,
            stored,
            mutex,
        })
    }

    /// Create the record for `name` as `Unlocked` if it does not exist yet.
    pub fn ensure(&self, name: &str) -> Result<LockRecord> {
        let mut txn = self.begin(name)?;
        txn.commit()?;
        Ok(txn.record().clone())
    }

    /// Snapshot of the record for `name`. A missing record reads as `Unlocked`.
    pub fn read(&self, name: &str) -> Result<LockRecord> {
        let key = sanitize_resource_name(name)?;
        let record = self.read_key(&key)?;
        Ok(record.unwrap_or_else(|| LockRecord::unlocked(name)))
    }

    fn read_key(&self, key: &str) -> Result<Option<LockRecord>> {
        let mutex = self.open_mutex(key)?;
        mutex.lock_shared().map_err(|e| {
            MachineLockError::StorageError(format!(
                "failed to lock record mutex for '{}': {}",
                key, e
            ))
        })?;

        let record = read_record_file(&self.record_path_for_key(key));
        let _ = mutex.unlock();
        record
    }

    /// All records in the store, sorted by resource name.
    ///
    /// Files that do not decode as records are skipped with a warning.
    pub fn list(&self) -> Result<Vec<LockRecord>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            MachineLockError::StorageError(format!(
                "failed to read lock store '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                MachineLockError::StorageError(format!(
                    "failed to read lock store entry: {}",
                    e
                ))
            })?;

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if key.starts_with('.') {
                continue;
            }

            match self.read_key(key) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => log::warn!("skipping '{}': {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.resource.cmp(&b.resource));
        Ok(records)
    }

    fn open_mutex(&self, key: &str) -> Result<File> {
        let path = self.mutex_path_for_key(key);
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                MachineLockError::StorageError(format!(
                    "failed to open record mutex '{}': {}",
                    path.display(),
                    e
                ))
            })
    }
}

/// An in-progress read-modify-write of one record.
///
/// The advisory lock is released when the transaction is dropped. Changes
/// reach disk only through [`RecordTxn::commit`].
#[derive(Debug)]
pub struct RecordTxn {
    path: PathBuf,
    record: LockRecord,
    /// What is on disk; `None` if the record file does not exist yet.
    stored: Option<LockRecord>,
    mutex: File,
}

impl RecordTxn {
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut LockRecord {
        &mut self.record
    }

    /// Persist the record if it differs from what is on disk (or if there is
    /// nothing on disk yet). Returns whether a write happened.
    pub fn commit(&mut self) -> Result<bool> {
        if self.stored.as_ref() == Some(&self.record) {
            return Ok(false);
        }

        self.record.validate()?;
        self.record.updated_at = Utc::now();

        let json = serde_json::to_string_pretty(&self.record).map_err(|e| {
            MachineLockError::StorageError(format!("failed to serialize lock record: {}", e))
        })?;
        atomic_write(&self.path, json.as_bytes())?;

        self.stored = Some(self.record.clone());
        Ok(true)
    }
}

impl Drop for RecordTxn {
    fn drop(&mut self) {
        let _ = self.mutex.unlock();
    }
}

/// Read and validate a record file. Missing or empty files yield `None`.
fn read_record_file(path: &Path) -> Result<Option<LockRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(MachineLockError::StorageError(format!(
                "failed to read lock record '{}': {}",
                path.display(),
                e
            )));
        }
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    let record: LockRecord = serde_json::from_str(&content).map_err(|e| {
        MachineLockError::CorruptRecord(format!("'{}': {}", path.display(), e))
    })?;
    record.validate()?;

    Ok(Some(record))
}
