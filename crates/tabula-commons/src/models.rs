//! Domain newtypes shared across Tabula crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum accepted tenant identifier length.
///
/// Matches the longest legal email address; anything longer is rejected
/// before it can reach the filesystem layer.
pub const MAX_TENANT_ID_LENGTH: usize = 254;

/// Errors produced when constructing a [`TenantId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantIdError {
    #[error("tenant identifier cannot be empty")]
    Empty,

    #[error("tenant identifier exceeds {MAX_TENANT_ID_LENGTH} characters")]
    TooLong,

    #[error("tenant identifier contains forbidden sequence '{0}'")]
    Forbidden(String),
}

/// A validated tenant identifier (the normalized account email).
///
/// Construction is the single choke point for identifier hygiene: path
/// separators, traversal sequences, and NUL bytes are rejected here so the
/// store locator can treat every `TenantId` as safe for use in a path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, TenantIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TenantIdError::Empty);
        }
        if trimmed.len() > MAX_TENANT_ID_LENGTH {
            return Err(TenantIdError::TooLong);
        }
        for forbidden in ["/", "\\", "..", "\0"] {
            if trimmed.contains(forbidden) {
                return Err(TenantIdError::Forbidden(forbidden.replace('\0', "\\0")));
            }
        }
        Ok(TenantId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TenantId::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_normal_emails() {
        for raw in ["alice@example.com", "bob.smith@corp.io", "under_score@x.dev"] {
            let id = TenantId::new(raw).unwrap();
            assert_eq!(id.as_str(), raw);
        }
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let id = TenantId::new("  alice@example.com  ").unwrap();
        assert_eq!(id.as_str(), "alice@example.com");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(TenantId::new(""), Err(TenantIdError::Empty));
        assert_eq!(TenantId::new("   "), Err(TenantIdError::Empty));
    }

    #[test]
    fn test_rejects_traversal_sequences() {
        assert!(matches!(
            TenantId::new("../etc/passwd"),
            Err(TenantIdError::Forbidden(_))
        ));
        assert!(matches!(
            TenantId::new("a/b@example.com"),
            Err(TenantIdError::Forbidden(_))
        ));
        assert!(matches!(
            TenantId::new("a\\b@example.com"),
            Err(TenantIdError::Forbidden(_))
        ));
        assert!(matches!(
            TenantId::new("evil..@example.com"),
            Err(TenantIdError::Forbidden(_))
        ));
    }

    #[test]
    fn test_rejects_overlong() {
        let raw = format!("{}@example.com", "a".repeat(MAX_TENANT_ID_LENGTH));
        assert_eq!(TenantId::new(raw), Err(TenantIdError::TooLong));
    }

    #[test]
    fn test_serde_round_trip() {
        let id = TenantId::new("alice@example.com").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"alice@example.com\"");
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let result: Result<TenantId, _> = serde_json::from_str("\"../oops\"");
        assert!(result.is_err());
    }
}
