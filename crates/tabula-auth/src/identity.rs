//! Identity store: the `users` table.
//!
//! One SQLite file for all accounts (tenant data lives elsewhere, one file
//! per tenant). Connections are opened per operation, matching the rest of
//! the system's no-pooling policy.

use crate::error::{AuthError, AuthResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::time::Duration;
use tabula_commons::TenantId;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Open (creating if needed) the identity database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { path };
        let conn = store.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            )",
        )?;
        debug!("identity store ready at {}", store.path.display());
        Ok(store)
    }

    fn connect(&self) -> AuthResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create an account. `AlreadyExists` if the email is taken.
    pub fn register(&self, tenant: &TenantId, password_hash: &str) -> AuthResult<()> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO users (email, password) VALUES (?1, ?2)",
            params![tenant.as_str(), password_hash],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(AuthError::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    /// Stored password hash for an account, `None` if unknown.
    pub fn password_hash(&self, tenant: &TenantId) -> AuthResult<Option<String>> {
        let conn = self.connect()?;
        let hash = conn
            .query_row(
                "SELECT password FROM users WHERE email = ?1",
                params![tenant.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Delete an account. Compensating action for failed provisioning;
    /// succeeds even if the account is already gone.
    pub fn remove(&self, tenant: &TenantId) -> AuthResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM users WHERE email = ?1",
            params![tenant.as_str()],
        )?;
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}
