//! Actix extractor for authenticated tenants.
//!
//! Authentication is a pure function composed in front of each handler:
//! handlers declare an [`AuthTenant`] parameter and never touch headers or
//! tokens themselves. Missing credentials map to 401, invalid or expired
//! ones to 403.

use crate::error::AuthError;
use crate::jwt::JwtAuth;
use actix_web::http::header;
use actix_web::{dev::Payload, error::InternalError, web, FromRequest, HttpRequest, HttpResponse};
use serde_json::json;
use std::future::{ready, Ready};
use tabula_commons::TenantId;

/// The tenant proven by the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthTenant(pub TenantId);

/// Validate an `Authorization` header value against the token service.
pub fn authenticate(jwt: &JwtAuth, auth_header: Option<&str>) -> Result<TenantId, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingToken)?;
    let token = JwtAuth::extract_token(header)?;
    let claims = jwt.validate_token(token)?;
    claims.tenant_id()
}

impl FromRequest for AuthTenant {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_tenant(req))
    }
}

fn extract_tenant(req: &HttpRequest) -> Result<AuthTenant, actix_web::Error> {
    let Some(jwt) = req.app_data::<web::Data<JwtAuth>>() else {
        log::error!("JwtAuth app data missing; auth is not wired up");
        return Err(InternalError::from_response(
            "auth not configured",
            HttpResponse::InternalServerError()
                .json(json!({ "error": "authentication not configured" })),
        )
        .into());
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match authenticate(jwt.get_ref(), auth_header) {
        Ok(tenant) => Ok(AuthTenant(tenant)),
        Err(err @ (AuthError::MissingToken | AuthError::InvalidFormat)) => {
            Err(InternalError::from_response(
                err.to_string(),
                HttpResponse::Unauthorized().json(json!({ "error": "Missing token" })),
            )
            .into())
        }
        Err(err) => Err(InternalError::from_response(
            err.to_string(),
            HttpResponse::Forbidden().json(json!({ "error": "Invalid or expired token" })),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtAuth {
        JwtAuth::new("test-secret", 24)
    }

    #[test]
    fn test_authenticate_valid_header() {
        let auth = jwt();
        let tenant = TenantId::new("alice@example.com").unwrap();
        let token = auth.issue_token(&tenant).unwrap();
        let header = format!("Bearer {token}");
        assert_eq!(authenticate(&auth, Some(&header)).unwrap(), tenant);
    }

    #[test]
    fn test_authenticate_missing_header() {
        assert!(matches!(
            authenticate(&jwt(), None),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_authenticate_garbage_token() {
        assert!(matches!(
            authenticate(&jwt(), Some("Bearer not-a-jwt")),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
