//! Atomic record replacement.
//!
//! Every write follows the same pattern:
//! 1. Write content to `.{filename}.tmp` next to the target
//! 2. fsync the temporary file
//! 3. `rename()` it over the target and fsync the parent directory
//!
//! Callers hold the per-record mutex while writing, so the fixed temporary
//! name cannot be raced by another writer of the same record. A crash between
//! steps 1 and 3 can leave the temporary file behind; it is overwritten by the
//! next write and never read.

use crate::error::{MachineLockError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace `path` with `content`.
///
/// The parent directory must already exist; the lock store creates it when
/// it is opened.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path)?;

    write_and_sync(&temp_path, content)?;
    replace(&temp_path, path)?;

    Ok(())
}

/// Temporary sibling used while writing `target`.
pub(crate) fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            MachineLockError::StorageError(format!(
                "invalid record path '{}'",
                target.display()
            ))
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        MachineLockError::StorageError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        MachineLockError::StorageError(format!(
            "failed to write temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        MachineLockError::StorageError(format!(
            "failed to sync temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

fn replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        MachineLockError::StorageError(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    if let Some(parent) = target.parent() {
        sync_dir(parent);
    }

    Ok(())
}

/// Persist the directory entry of a freshly renamed record. Best effort.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
