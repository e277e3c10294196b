//! Storage error handling
//!
//! Provides typed errors for storage engine operations. The precondition
//! failure and the timeout are separate variants so the writer can retry
//! exactly one of them and callers can tell the other apart.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur at the storage engine boundary
#[derive(Error, Debug)]
pub enum StorageError {
    /// A transaction precondition did not hold; nothing was written
    #[error("Transaction precondition failed")]
    ConditionFailed,

    /// The engine was busy or locked for longer than the configured timeout
    #[error("Storage engine timed out")]
    Timeout,

    /// Batched point read asked for more keys than the engine allows
    #[error("Batch of {requested} keys exceeds the engine limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Stored row violates an invariant (e.g. non-positive id)
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// Stored row could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A panic poisoned the engine's connection lock
    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create an error from an I/O error raised while preparing `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Check if a retry of the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Timeout)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StorageError::Timeout
            }
            _ => StorageError::Database(error),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_maps_to_timeout() {
        let err = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        assert!(matches!(err, StorageError::Timeout));
        assert!(err.is_retryable());

        let err = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED));
        assert!(matches!(err, StorageError::Timeout));
    }

    #[test]
    fn test_other_sqlite_errors_stay_database() {
        let err = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT));
        assert!(matches!(err, StorageError::Database(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_condition_failed_is_not_retryable() {
        assert!(!StorageError::ConditionFailed.is_retryable());
    }

    #[test]
    fn test_batch_too_large_display() {
        let err = StorageError::BatchTooLarge {
            requested: 150,
            max: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("150"));
        assert!(msg.contains("100"));
    }
}
