//! Registration and login.

use crate::models::{ErrorBody, LoginRequest, MessageResponse, RegisterRequest, TokenResponse};
use crate::state::AppContext;
use actix_web::{post, web, HttpResponse};
use std::sync::Arc;
use tabula_auth::{hash_password, validate_password, verify_password, AuthError, JwtAuth};
use tabula_commons::TenantId;
use tabula_store::StoreError;

enum RegistrationError {
    Exists,
    Identity(AuthError),
    Provision(StoreError),
}

/// Create the account, then provision the tenant store. The two must fail
/// together: a provisioning failure rolls the account back so no tenant is
/// ever registered without a store.
fn register_and_provision(
    ctx: &AppContext,
    tenant: &TenantId,
    password_hash: &str,
) -> Result<(), RegistrationError> {
    match ctx.identity.register(tenant, password_hash) {
        Ok(()) => {}
        Err(AuthError::AlreadyExists) => return Err(RegistrationError::Exists),
        Err(err) => return Err(RegistrationError::Identity(err)),
    }

    if let Err(err) = ctx.stores.ensure_store(tenant) {
        if let Err(cleanup) = ctx.identity.remove(tenant) {
            log::error!(
                "failed to roll back account {} after provisioning error: {}",
                tenant,
                cleanup
            );
        }
        return Err(RegistrationError::Provision(err));
    }
    Ok(())
}

/// POST /v1/api/register
#[post("/register")]
pub async fn register(
    ctx: web::Data<Arc<AppContext>>,
    body: web::Json<RegisterRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let tenant = match TenantId::new(body.email) {
        Ok(tenant) => tenant,
        Err(err) => return HttpResponse::BadRequest().json(ErrorBody::new(err.to_string())),
    };
    if let Err(err) = validate_password(&body.password) {
        return HttpResponse::BadRequest().json(ErrorBody::new(err.to_string()));
    }

    let password_hash = match hash_password(&body.password).await {
        Ok(hash) => hash,
        Err(err) => {
            log::error!("password hashing failed: {err}");
            return HttpResponse::InternalServerError().json(ErrorBody::new("registration failed"));
        }
    };

    let block_ctx = ctx.clone();
    let block_tenant = tenant.clone();
    let result =
        web::block(move || register_and_provision(&block_ctx, &block_tenant, &password_hash)).await;

    match result {
        Ok(Ok(())) => {
            log::info!("registered tenant {}", tenant);
            HttpResponse::Ok().json(MessageResponse::new("Registered successfully"))
        }
        Ok(Err(RegistrationError::Exists)) => {
            HttpResponse::BadRequest().json(ErrorBody::new("Email already exists"))
        }
        Ok(Err(RegistrationError::Identity(err))) => {
            log::error!("identity store failure during registration: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new("registration failed"))
        }
        Ok(Err(RegistrationError::Provision(err))) => {
            log::error!("tenant store provisioning failed for {}: {}", tenant, err);
            HttpResponse::InternalServerError()
                .json(ErrorBody::new("failed to provision tenant store"))
        }
        Err(err) => {
            log::error!("blocking pool failure during registration: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new("registration failed"))
        }
    }
}

/// POST /v1/api/login
#[post("/login")]
pub async fn login(
    ctx: web::Data<Arc<AppContext>>,
    jwt: web::Data<JwtAuth>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    // A malformed identifier can never match an account; same answer as a
    // wrong password so login never leaks which emails exist.
    let Ok(tenant) = TenantId::new(body.email) else {
        return HttpResponse::Unauthorized().json(ErrorBody::new("Invalid credentials"));
    };

    let block_ctx = ctx.clone();
    let block_tenant = tenant.clone();
    let stored_hash = match web::block(move || block_ctx.identity.password_hash(&block_tenant)).await
    {
        Ok(Ok(hash)) => hash,
        Ok(Err(err)) => {
            log::error!("identity lookup failed: {err}");
            return HttpResponse::InternalServerError().json(ErrorBody::new("login failed"));
        }
        Err(err) => {
            log::error!("blocking pool failure during login: {err}");
            return HttpResponse::InternalServerError().json(ErrorBody::new("login failed"));
        }
    };

    let Some(stored_hash) = stored_hash else {
        return HttpResponse::Unauthorized().json(ErrorBody::new("Invalid credentials"));
    };

    match verify_password(&body.password, &stored_hash).await {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized().json(ErrorBody::new("Invalid credentials"));
        }
        Err(err) => {
            log::error!("password verification failed: {err}");
            return HttpResponse::InternalServerError().json(ErrorBody::new("login failed"));
        }
    }

    match jwt.issue_token(&tenant) {
        Ok(token) => HttpResponse::Ok().json(TokenResponse { token }),
        Err(err) => {
            log::error!("token issuance failed for {}: {}", tenant, err);
            HttpResponse::InternalServerError().json(ErrorBody::new("login failed"))
        }
    }
}
