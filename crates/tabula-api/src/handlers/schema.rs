//! Schema introspection endpoint.

use super::store_error_response;
use crate::models::ErrorBody;
use crate::state::AppContext;
use actix_web::{get, web, HttpResponse};
use std::sync::Arc;
use tabula_auth::AuthTenant;

/// GET /v1/api/schema
///
/// Returns `{table: [columns...]}` for the tenant's store; 404 when the
/// tenant has no store yet.
#[get("/schema")]
pub async fn describe_schema(tenant: AuthTenant, ctx: web::Data<Arc<AppContext>>) -> HttpResponse {
    let block_ctx = ctx.clone();
    let block_tenant = tenant.0;
    let result = web::block(move || block_ctx.stores.describe_store(&block_tenant)).await;

    match result {
        Ok(Ok(schema)) => HttpResponse::Ok().json(schema),
        Ok(Err(err)) => store_error_response(err),
        Err(err) => {
            log::error!("blocking pool failure during introspection: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new("introspection failed"))
        }
    }
}
