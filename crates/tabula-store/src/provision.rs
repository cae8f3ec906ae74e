//! Tenant store provisioning.

use crate::{StoreError, TenantStores};
use log::debug;
use rusqlite::Connection;
use std::fs;
use tabula_commons::TenantId;

impl TenantStores {
    /// Ensure the tenant's private store exists.
    ///
    /// Creates the tenant directory and an empty SQLite file if absent.
    /// Idempotent: calling twice has the same effect as once. Invoked at
    /// registration; the caller must treat a failure here as a failed
    /// registration (see the register handler's compensation).
    pub fn ensure_store(&self, tenant: &TenantId) -> Result<(), StoreError> {
        let dir = self.tenant_dir(tenant);
        fs::create_dir_all(&dir)?;

        let path = self.store_path(tenant);
        if !path.exists() {
            // Opening creates the file; dropping the handle releases it.
            let conn = Connection::open(&path)?;
            drop(conn);
            debug!("provisioned tenant store at {}", path.display());
        }
        Ok(())
    }
}
