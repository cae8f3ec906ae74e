//! Tabula authentication.
//!
//! Identity lives in a single SQLite `users` table; credentials are bcrypt
//! hashes; sessions are stateless HS256 bearer tokens. The actix extractor
//! in [`extractor`] is the only place tokens are read out of requests, so
//! handlers receive an already-authenticated [`tabula_commons::TenantId`].

pub mod error;
pub mod extractor;
pub mod identity;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use extractor::{authenticate, AuthTenant};
pub use identity::IdentityStore;
pub use jwt::{Claims, JwtAuth};
pub use password::{hash_password, validate_password, verify_password};
