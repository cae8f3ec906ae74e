//! Authentication error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No Authorization header / no token in it.
    #[error("missing bearer token")]
    MissingToken,

    /// Header present but not `Bearer <token>`.
    #[error("invalid authorization format (expected 'Bearer <token>')")]
    InvalidFormat,

    /// Signature mismatch, malformed token, or bad claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    /// Unknown account or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration for an email that already has an account.
    #[error("email already exists")]
    AlreadyExists,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Identity store I/O or engine failure.
    #[error("identity store error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
