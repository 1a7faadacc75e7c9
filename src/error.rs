//! Error types for machine-lock.
//!
//! Contention is never an error: a denied claim is `Ok(false)`. The variants
//! here are reserved for conditions where the lock state could not be
//! determined or persisted, so automation can tell "resource busy" apart from
//! "lock subsystem broken".

use crate::exit_codes;
use thiserror::Error;

/// Main error type for machine-lock operations.
#[derive(Error, Debug)]
pub enum MachineLockError {
    /// Caller supplied an unusable resource name, argument, or config value.
    #[error("{0}")]
    UserError(String),

    /// The store directory or a record file could not be created, read, or written.
    #[error("Lock store failure: {0}")]
    StorageError(String),

    /// A record file exists but does not decode to a valid lock record.
    #[error("Corrupt lock record: {0}")]
    CorruptRecord(String),
}

impl MachineLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            MachineLockError::UserError(_) => exit_codes::USER_ERROR,
            MachineLockError::StorageError(_) => exit_codes::STORAGE_FAILURE,
            MachineLockError::CorruptRecord(_) => exit_codes::STORAGE_FAILURE,
        }
    }
}

/// Result type alias for machine-lock operations.
pub type Result<T> = std::result::Result<T, MachineLockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = MachineLockError::UserError("empty resource name".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn storage_errors_share_exit_code() {
        let err = MachineLockError::StorageError("disk full".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORAGE_FAILURE);

        let err = MachineLockError::CorruptRecord("dut-1.lock".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORAGE_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = MachineLockError::StorageError("permission denied".to_string());
        assert_eq!(err.to_string(), "Lock store failure: permission denied");

        let err = MachineLockError::CorruptRecord("bad json".to_string());
        assert_eq!(err.to_string(), "Corrupt lock record: bad json");
    }
}
