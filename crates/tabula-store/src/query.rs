//! Query execution: run tenant-authored SQL against the tenant's own store.
//!
//! Isolation is enforced solely by per-tenant file separation. The tenant
//! has unrestricted SQL over their own data — including destructive
//! statements — by design; what we guard against is runaway statements
//! (bounded wall-clock timeout via SQLite's interrupt handle) and lock
//! contention (surfaced as a retryable busy error).

use crate::error::{is_busy, StoreError};
use crate::TenantStores;
use log::warn;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value as JsonValue;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;
use tabula_commons::TenantId;

/// Result of executing tenant SQL.
///
/// Tenant mistakes (syntax errors, missing tables, constraint violations)
/// are data, not faults: the boundary layer decides how to represent them.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows {
        /// Empty when the statement produces no result set (e.g. an UPDATE).
        columns: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
    },
    Error {
        message: String,
    },
}

impl TenantStores {
    /// Execute `sql` verbatim against the tenant's store.
    ///
    /// `Err` is reserved for infrastructure problems (missing store, lock
    /// contention, engine failure); errors in the SQL itself come back as
    /// `Ok(QueryOutcome::Error)`.
    pub fn run_query(&self, tenant: &TenantId, sql: &str) -> Result<QueryOutcome, StoreError> {
        let conn = self.open_store(tenant)?;

        let watchdog = (!self.query_timeout.is_zero())
            .then(|| InterruptWatchdog::arm(&conn, self.query_timeout));

        let result = execute_statement(&conn, sql);
        drop(watchdog);

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) if is_busy(&err) => Err(StoreError::Busy),
            Err(err) => {
                warn!("query failed for tenant {}: {}", tenant, err);
                Ok(QueryOutcome::Error {
                    message: err.to_string(),
                })
            }
        }
    }
}

fn execute_statement(conn: &Connection, sql: &str) -> rusqlite::Result<QueryOutcome> {
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        // No result set: DML/DDL. Execute and commit any open transaction
        // so data-modifying effects persist.
        stmt.execute([])?;
        drop(stmt);
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        return Ok(QueryOutcome::Rows {
            columns: Vec::new(),
            rows: Vec::new(),
        });
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(column_count);
        for i in 0..column_count {
            record.push(value_to_json(row.get_ref(i)?));
        }
        out.push(record);
    }

    Ok(QueryOutcome::Rows { columns, rows: out })
}

fn value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(v) => JsonValue::from(v),
        ValueRef::Real(v) => serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(v) => JsonValue::String(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => JsonValue::String(String::from_utf8_lossy(v).into_owned()),
    }
}

/// Interrupts the connection if the statement outlives the timeout.
///
/// Dropping the guard disarms the timer and joins the watchdog thread, so
/// an interrupt can never hit a later statement on a reused connection.
struct InterruptWatchdog {
    disarm: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl InterruptWatchdog {
    fn arm(conn: &Connection, timeout: Duration) -> Self {
        let handle = conn.get_interrupt_handle();
        let (disarm, armed) = mpsc::channel();
        let thread = std::thread::spawn(move || {
            if armed.recv_timeout(timeout).is_err() {
                warn!("query exceeded {:?}, interrupting", timeout);
                handle.interrupt();
            }
        });
        Self {
            disarm,
            thread: Some(thread),
        }
    }
}

impl Drop for InterruptWatchdog {
    fn drop(&mut self) {
        let _ = self.disarm.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TenantStores, TenantId) {
        let dir = TempDir::new().unwrap();
        let stores = TenantStores::new(dir.path().join("tenants"), Duration::from_secs(30));
        let tenant = TenantId::new("alice@example.com").unwrap();
        stores.ensure_store(&tenant).unwrap();
        (dir, stores, tenant)
    }

    #[test]
    fn test_select_literal_on_empty_store() {
        let (_dir, stores, tenant) = setup();
        let outcome = stores.run_query(&tenant, "SELECT 1").unwrap();
        assert_eq!(
            outcome,
            QueryOutcome::Rows {
                columns: vec!["1".to_string()],
                rows: vec![vec![json!(1)]],
            }
        );
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let (_dir, stores, _) = setup();
        let ghost = TenantId::new("ghost@example.com").unwrap();
        assert!(matches!(
            stores.run_query(&ghost, "SELECT 1"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_invalid_sql_is_error_as_data() {
        let (_dir, stores, tenant) = setup();
        match stores.run_query(&tenant, "SELEC 1").unwrap() {
            QueryOutcome::Error { message } => assert!(message.contains("syntax")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The store keeps serving after a bad statement.
        assert!(stores.run_query(&tenant, "SELECT 1").is_ok());
    }

    #[test]
    fn test_dml_has_no_result_set_and_persists() {
        let (_dir, stores, tenant) = setup();
        let create = stores
            .run_query(&tenant, "CREATE TABLE notes (body TEXT)")
            .unwrap();
        assert_eq!(
            create,
            QueryOutcome::Rows {
                columns: vec![],
                rows: vec![]
            }
        );

        stores
            .run_query(&tenant, "INSERT INTO notes VALUES ('hi')")
            .unwrap();

        // Effects visible on a fresh connection.
        match stores.run_query(&tenant, "SELECT body FROM notes").unwrap() {
            QueryOutcome::Rows { columns, rows } => {
                assert_eq!(columns, vec!["body"]);
                assert_eq!(rows, vec![vec![json!("hi")]]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_null_and_real_values_round_trip_as_json() {
        let (_dir, stores, tenant) = setup();
        match stores
            .run_query(&tenant, "SELECT NULL, 1.5, 'txt'")
            .unwrap()
        {
            QueryOutcome::Rows { rows, .. } => {
                assert_eq!(rows, vec![vec![json!(null), json!(1.5), json!("txt")]]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_runaway_query_is_interrupted() {
        let dir = TempDir::new().unwrap();
        let stores = TenantStores::new(dir.path().join("tenants"), Duration::from_millis(100));
        let tenant = TenantId::new("alice@example.com").unwrap();
        stores.ensure_store(&tenant).unwrap();

        let unbounded = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                         SELECT count(*) FROM c";
        match stores.run_query(&tenant, unbounded).unwrap() {
            QueryOutcome::Error { message } => {
                assert!(message.to_lowercase().contains("interrupt"), "{message}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // The store keeps serving after an interrupted statement.
        assert_eq!(
            stores.run_query(&tenant, "SELECT 1").unwrap(),
            QueryOutcome::Rows {
                columns: vec!["1".to_string()],
                rows: vec![vec![json!(1)]],
            }
        );
    }

    #[test]
    fn test_tenants_cannot_see_each_other() {
        let (_dir, stores, alice) = setup();
        let bob = TenantId::new("bob@example.com").unwrap();
        stores.ensure_store(&bob).unwrap();

        stores
            .import_file(&alice, "sales.csv", b"id\n1\n")
            .unwrap();

        match stores.run_query(&bob, "SELECT * FROM sales").unwrap() {
            QueryOutcome::Error { message } => assert!(message.contains("no such table")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
