//! Bearer token issuance and validation (HS256).

use crate::error::{AuthError, AuthResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tabula_commons::TenantId;

/// Token claims. `sub` carries the tenant identifier (account email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    /// The tenant this token was issued to. Re-validated on every decode so
    /// a token minted against older identifier rules cannot smuggle a bad
    /// path segment.
    pub fn tenant_id(&self) -> AuthResult<TenantId> {
        TenantId::new(self.sub.as_str()).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Issues and validates bearer tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    expiry_hours: i64,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: impl Into<String>, expiry_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60; // clock-skew allowance in seconds

        Self {
            secret: secret.into(),
            expiry_hours,
            validation,
        }
    }

    /// Sign a token for the tenant, expiring `expiry_hours` from now.
    pub fn issue_token(&self, tenant: &TenantId) -> AuthResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.expiry_hours);
        let claims = Claims {
            sub: tenant.as_str().to_string(),
            iat: now.timestamp() as u64,
            exp: exp.timestamp() as u64,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Validate a raw token (no `Bearer ` prefix) and return its claims.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &self.validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
    }

    /// Pull the raw token out of an `Authorization` header value.
    pub fn extract_token(auth_header: &str) -> AuthResult<&str> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new("alice@example.com").unwrap()
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let auth = JwtAuth::new("test-secret", 24);
        let token = auth.issue_token(&tenant()).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.tenant_id().unwrap(), tenant());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtAuth::new("secret-one", 24);
        let verifier = JwtAuth::new("secret-two", 24);
        let token = issuer.issue_token(&tenant()).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = JwtAuth::new("test-secret", 24);
        // Forge an already-expired token (beyond the 60s leeway).
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(auth.validate_token(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(JwtAuth::extract_token("Bearer abc").unwrap(), "abc");
        assert!(matches!(
            JwtAuth::extract_token("Basic abc"),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            JwtAuth::extract_token("Bearer "),
            Err(AuthError::MissingToken)
        ));
    }
}
