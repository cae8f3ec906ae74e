//! HTTP request handlers.

pub mod auth;
pub mod query;
pub mod schema;
pub mod sqlgen;
pub mod transcribe;
pub mod upload;

pub use auth::{login, register};
pub use query::run_query;
pub use schema::describe_schema;
pub use sqlgen::generate_sql;
pub use transcribe::transcribe_audio;
pub use upload::upload_schema;

use crate::models::ErrorBody;
use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::StreamExt as _;
use tabula_llm::LlmError;
use tabula_store::StoreError;

/// Hard cap for a single uploaded file.
pub(crate) const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Single place that turns store errors into status codes.
pub(crate) fn store_error_response(err: StoreError) -> HttpResponse {
    match err {
        StoreError::NotFound => {
            HttpResponse::NotFound().json(ErrorBody::new("No schema uploaded yet"))
        }
        StoreError::UnsupportedFormat(_)
        | StoreError::Parse(_)
        | StoreError::InvalidFileName(_) => {
            HttpResponse::BadRequest().json(ErrorBody::new(err.to_string()))
        }
        StoreError::Busy => {
            HttpResponse::ServiceUnavailable().json(ErrorBody::new(err.to_string()))
        }
        StoreError::Io(_) | StoreError::Sqlite(_) => {
            log::error!("store failure: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new("storage failure"))
        }
    }
}

/// Upstream model failures are the upstream's fault, not the client's.
pub(crate) fn llm_error_response(err: LlmError) -> HttpResponse {
    match err {
        LlmError::MissingApiKey => {
            HttpResponse::ServiceUnavailable().json(ErrorBody::new(err.to_string()))
        }
        LlmError::Http(_) | LlmError::Api { .. } | LlmError::EmptyResponse => {
            log::warn!("LLM call failed: {err}");
            HttpResponse::BadGateway().json(ErrorBody::new(err.to_string()))
        }
    }
}

#[derive(Debug)]
pub(crate) enum UploadReadError {
    /// The expected multipart field was not present.
    Missing,
    TooLarge,
    Malformed(String),
}

/// Read one named file part out of a multipart payload into memory.
pub(crate) async fn read_file_field(
    payload: &mut Multipart,
    field_name: &str,
) -> Result<(String, Vec<u8>), UploadReadError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadReadError::Malformed(e.to_string()))?;
        if field.name() != field_name {
            continue;
        }

        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .ok_or_else(|| UploadReadError::Malformed("file part has no filename".to_string()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| UploadReadError::Malformed(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(UploadReadError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((file_name, bytes));
    }
    Err(UploadReadError::Missing)
}

/// Map a multipart read failure, with an endpoint-specific message for the
/// missing-field case ("No file uploaded" vs "No audio uploaded").
pub(crate) fn upload_read_error_response(
    err: UploadReadError,
    missing_message: &str,
) -> HttpResponse {
    match err {
        UploadReadError::Missing => {
            HttpResponse::BadRequest().json(ErrorBody::new(missing_message))
        }
        UploadReadError::TooLarge => HttpResponse::PayloadTooLarge().json(ErrorBody::new(
            format!("upload exceeds {MAX_UPLOAD_BYTES} bytes"),
        )),
        UploadReadError::Malformed(msg) => {
            HttpResponse::BadRequest().json(ErrorBody::new(format!("malformed upload: {msg}")))
        }
    }
}
