//! Tenant store location.
//!
//! Maps a tenant identifier to its private directory and store file. The
//! escaping is deterministic and injective over the accepted identifier
//! set: `_` doubles to `__` before the `@`/`.` markers are applied, so
//! `a_at_b` and `a@b` can never land in the same directory. Pure functions,
//! no side effects; `TenantId` construction has already rejected path
//! separators and traversal sequences.

use crate::{TenantStores, STORE_FILE_NAME, UPLOADS_DIR_NAME};
use std::path::PathBuf;
use tabula_commons::TenantId;

/// Escape a tenant identifier into a single safe path segment.
pub(crate) fn escape_tenant_id(tenant: &TenantId) -> String {
    let raw = tenant.as_str();
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '_' => out.push_str("__"),
            '@' => out.push_str("_at_"),
            '.' => out.push_str("_dot_"),
            c => out.push(c),
        }
    }
    out
}

impl TenantStores {
    /// Private directory for a tenant (store file plus raw uploads).
    pub fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        self.root.join(escape_tenant_id(tenant))
    }

    /// Path of the tenant's private SQLite store.
    pub fn store_path(&self, tenant: &TenantId) -> PathBuf {
        self.tenant_dir(tenant).join(STORE_FILE_NAME)
    }

    /// Directory where raw uploads are kept, separate from the store file
    /// so no upload name can ever collide with it.
    pub fn uploads_dir(&self, tenant: &TenantId) -> PathBuf {
        self.tenant_dir(tenant).join(UPLOADS_DIR_NAME)
    }
}
