//! Error taxonomy for tenant-store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No store file exists for the tenant yet.
    #[error("no store exists for this tenant")]
    NotFound,

    /// Upload extension is not in the allow-list.
    #[error("unsupported file format '{0}' (expected csv, xlsx, or xls)")]
    UnsupportedFormat(String),

    /// The upload could not be parsed as tabular data.
    #[error("failed to parse upload: {0}")]
    Parse(String),

    /// Upload file name is unusable as a path segment.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// The store is locked by a concurrent writer; the operation can be
    /// retried as-is.
    #[error("tenant store is busy, retry the operation")]
    Busy,

    /// Filesystem failure while persisting uploads or creating stores.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite engine failure outside of tenant-authored SQL.
    #[error("store engine error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_busy(&err) {
            StoreError::Busy
        } else {
            StoreError::Sqlite(err)
        }
    }
}

/// Whether a SQLite error means "locked by another writer".
pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}
