//! Schema upload: parse a spreadsheet and materialize tenant tables.

use super::{read_file_field, store_error_response, upload_read_error_response};
use crate::models::UploadResponse;
use crate::state::AppContext;
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tabula_auth::AuthTenant;

/// POST /v1/api/schema/upload
///
/// Multipart body with a single `file` part (csv, xlsx, or xls). Each
/// parsed dataset replaces any existing table of the same name.
#[post("/schema/upload")]
pub async fn upload_schema(
    tenant: AuthTenant,
    ctx: web::Data<Arc<AppContext>>,
    mut payload: Multipart,
) -> HttpResponse {
    let (file_name, bytes) = match read_file_field(&mut payload, "file").await {
        Ok(part) => part,
        Err(err) => return upload_read_error_response(err, "No file uploaded"),
    };

    let tenant_id = tenant.0;
    log::info!(
        "importing '{}' ({} bytes) for tenant {}",
        file_name,
        bytes.len(),
        tenant_id
    );

    let block_ctx = ctx.clone();
    let block_tenant = tenant_id.clone();
    let result =
        web::block(move || block_ctx.stores.import_file(&block_tenant, &file_name, &bytes)).await;

    match result {
        Ok(Ok(outcome)) => {
            let tables: BTreeMap<_, _> = outcome
                .tables
                .into_iter()
                .map(|summary| (summary.table, summary.columns))
                .collect();
            HttpResponse::Ok().json(UploadResponse {
                message: "Schema uploaded successfully".to_string(),
                path: outcome.saved_path.display().to_string(),
                tables,
            })
        }
        Ok(Err(err)) => store_error_response(err),
        Err(err) => {
            log::error!("blocking pool failure during import: {err}");
            HttpResponse::InternalServerError()
                .json(crate::models::ErrorBody::new("import failed"))
        }
    }
}
