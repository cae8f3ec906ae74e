//! Schema introspection: enumerate a tenant's tables and columns.

use crate::{quote_ident, StoreError, TenantStores};
use std::collections::BTreeMap;
use tabula_commons::TenantId;

impl TenantStores {
    /// Describe every user table in the tenant's store.
    ///
    /// Returns table names mapped to column names in declared order.
    /// Internal `sqlite_*` catalog tables are excluded. Read-only; the
    /// connection is released on every exit path via RAII.
    pub fn describe_store(
        &self,
        tenant: &TenantId,
    ) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        let conn = self.open_store(tenant)?;

        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut schema = BTreeMap::new();
        for table in tables {
            // PRAGMA table_info yields rows in declared column order (cid).
            let mut info = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
            let columns: Vec<String> = info
                .query_map([], |row| row.get::<_, String>("name"))?
                .collect::<Result<_, _>>()?;
            schema.insert(table, columns);
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TenantStores, TenantId) {
        let dir = TempDir::new().unwrap();
        let stores = TenantStores::new(dir.path().join("tenants"), Duration::ZERO);
        let tenant = TenantId::new("alice@example.com").unwrap();
        (dir, stores, tenant)
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let (_dir, stores, tenant) = setup();
        assert!(matches!(
            stores.describe_store(&tenant),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_empty_store_has_empty_schema() {
        let (_dir, stores, tenant) = setup();
        stores.ensure_store(&tenant).unwrap();
        let schema = stores.describe_store(&tenant).unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn test_columns_in_declared_order() {
        let (_dir, stores, tenant) = setup();
        stores.ensure_store(&tenant).unwrap();
        stores
            .import_file(&tenant, "orders.csv", b"zeta,alpha,mid\n1,2,3\n")
            .unwrap();
        let schema = stores.describe_store(&tenant).unwrap();
        // Declared order, not alphabetical.
        assert_eq!(schema["orders"], vec!["zeta", "alpha", "mid"]);
    }
}
