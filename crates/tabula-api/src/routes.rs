//! API routes configuration.

use crate::handlers;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Configure API routes for Tabula.
///
/// All endpoints use the /v1 version prefix:
/// - POST /v1/api/register - Create an account and provision its store
/// - POST /v1/api/login - Exchange credentials for a JWT
/// - POST /v1/api/schema/upload - Import a spreadsheet (requires Auth)
/// - GET /v1/api/schema - Introspect the tenant store (requires Auth)
/// - POST /v1/api/query - Run SQL against the tenant store (requires Auth)
/// - POST /v1/api/sql/generate - Natural language to SQL (requires Auth)
/// - POST /v1/api/transcribe - Transcribe an audio upload (requires Auth)
/// - GET /v1/api/healthcheck - Health check endpoint
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1").service(
            web::scope("/api")
                .service(handlers::register)
                .service(handlers::login)
                .service(handlers::upload_schema)
                .service(handlers::describe_schema)
                .service(handlers::run_query)
                .service(handlers::generate_sql)
                .service(handlers::transcribe_audio)
                .route("/healthcheck", web::get().to(healthcheck_handler)),
        ),
    );
}

/// Health check endpoint handler.
async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1"
    }))
}
