//! Per-tenant SQLite stores.
//!
//! This crate is the data-isolation core of Tabula. Every tenant owns
//! exactly one SQLite file, located under a fixed root by the locator in
//! [`locator`]; no other component may compute that path. All operations
//! open a fresh connection, do one unit of work, and release it — handles
//! are never pooled or held across requests. Cross-tenant isolation is
//! purely physical (separate files); within a tenant, SQLite's own file
//! locking plus a busy timeout is the only write coordination.

pub mod error;
pub mod import;
pub mod introspect;
pub mod locator;
pub mod provision;
pub mod query;

pub use error::StoreError;
pub use import::{ColumnSummary, ColumnType, ImportOutcome, TableSummary};
pub use query::QueryOutcome;

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;
use tabula_commons::TenantId;

/// File name of the private store inside each tenant directory.
pub const STORE_FILE_NAME: &str = "store.db";

/// Subdirectory of the tenant directory holding raw uploads. Uploads never
/// share a directory with the store file, so an upload named `store.db`
/// cannot overwrite it.
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// How long a connection waits on SQLite's file lock before reporting a
/// busy error to the caller.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the tenant-store tree rooted at a fixed directory.
///
/// Cheap to share: holds only the root path and query limits. Connections
/// are opened per operation.
#[derive(Debug, Clone)]
pub struct TenantStores {
    root: PathBuf,
    query_timeout: Duration,
}

impl TenantStores {
    /// Create a handle rooted at `root`.
    ///
    /// `query_timeout` bounds the wall-clock time of a single tenant SQL
    /// statement; `Duration::ZERO` disables the bound.
    pub fn new(root: impl Into<PathBuf>, query_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            query_timeout,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Open an existing tenant store. `NotFound` if it was never provisioned.
    fn open_store(&self, tenant: &TenantId) -> Result<Connection, StoreError> {
        let path = self.store_path(tenant);
        if !path.exists() {
            return Err(StoreError::NotFound);
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Open a tenant store, creating the file (and directory) if absent.
    fn open_or_create_store(&self, tenant: &TenantId) -> Result<Connection, StoreError> {
        std::fs::create_dir_all(self.tenant_dir(tenant))?;
        let conn = Connection::open(self.store_path(tenant))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

/// Quote an identifier for embedding in SQLite DDL/DML text.
fn quote_ident(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_plain() {
        assert_eq!(quote_ident("sales"), "\"sales\"");
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("wei\"rd"), "\"wei\"\"rd\"");
    }
}
