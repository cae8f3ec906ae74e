//! Audio transcription via the upstream model.

use super::{llm_error_response, read_file_field, store_error_response, upload_read_error_response};
use crate::models::{ErrorBody, TranscriptResponse};
use crate::state::AppContext;
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use std::sync::Arc;
use tabula_auth::AuthTenant;

/// POST /v1/api/transcribe
///
/// Multipart body with a single `audio` part. The raw file is saved under
/// the tenant directory before transcription, same as spreadsheet uploads.
#[post("/transcribe")]
pub async fn transcribe_audio(
    tenant: AuthTenant,
    ctx: web::Data<Arc<AppContext>>,
    mut payload: Multipart,
) -> HttpResponse {
    let (file_name, bytes) = match read_file_field(&mut payload, "audio").await {
        Ok(part) => part,
        Err(err) => return upload_read_error_response(err, "No audio uploaded"),
    };

    let block_ctx = ctx.clone();
    let block_tenant = tenant.0.clone();
    let block_name = file_name.clone();
    let block_bytes = bytes.clone();
    let saved_path = match web::block(move || {
        block_ctx
            .stores
            .save_upload(&block_tenant, &block_name, &block_bytes)
    })
    .await
    {
        Ok(Ok(path)) => path,
        Ok(Err(err)) => return store_error_response(err),
        Err(err) => {
            log::error!("blocking pool failure while saving audio: {err}");
            return HttpResponse::InternalServerError()
                .json(ErrorBody::new("failed to save audio"));
        }
    };

    match ctx.llm.transcribe(&file_name, bytes).await {
        Ok(transcript) => HttpResponse::Ok().json(TranscriptResponse {
            transcript,
            path: saved_path.display().to_string(),
        }),
        Err(err) => llm_error_response(err),
    }
}
