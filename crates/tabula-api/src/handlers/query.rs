//! Ad hoc SQL execution against the tenant's store.

use super::store_error_response;
use crate::models::{ErrorBody, QueryRequest, QueryResponse};
use crate::state::AppContext;
use actix_web::{post, web, HttpResponse};
use std::sync::Arc;
use tabula_auth::AuthTenant;
use tabula_store::QueryOutcome;

/// POST /v1/api/query
///
/// Runs one SQL statement. SQL errors in the tenant's own statement come
/// back as 200 with `{"error": ...}`: a typo in user SQL is a result, not
/// a server fault. Infrastructure failures keep their error statuses.
#[post("/query")]
pub async fn run_query(
    tenant: AuthTenant,
    ctx: web::Data<Arc<AppContext>>,
    body: web::Json<QueryRequest>,
) -> HttpResponse {
    let sql = body.into_inner().sql;

    let block_ctx = ctx.clone();
    let block_tenant = tenant.0;
    let result = web::block(move || block_ctx.stores.run_query(&block_tenant, &sql)).await;

    match result {
        Ok(Ok(QueryOutcome::Rows { columns, rows })) => {
            HttpResponse::Ok().json(QueryResponse { columns, rows })
        }
        Ok(Ok(QueryOutcome::Error { message })) => HttpResponse::Ok().json(ErrorBody::new(message)),
        Ok(Err(err)) => store_error_response(err),
        Err(err) => {
            log::error!("blocking pool failure during query: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new("query failed"))
        }
    }
}
