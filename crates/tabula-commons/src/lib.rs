//! Shared domain types for Tabula.
//!
//! Kept dependency-light so every other crate can use these types without
//! pulling in storage or HTTP machinery.

pub mod models;

pub use models::{TenantId, TenantIdError};
