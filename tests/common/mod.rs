//! Shared helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use tabula_api::AppContext;
use tabula_auth::{IdentityStore, JwtAuth};
use tabula_llm::{LlmClient, LlmConfig};
use tabula_store::TenantStores;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// In-process application state backed by a temporary data directory.
///
/// Each test builds its own Actix app from these pieces:
///
/// ```ignore
/// let server = TestServer::new();
/// let app = test::init_service(
///     App::new()
///         .app_data(server.context_data())
///         .app_data(server.jwt_data())
///         .configure(configure_routes),
/// )
/// .await;
/// ```
pub struct TestServer {
    pub ctx: Arc<AppContext>,
    pub jwt: JwtAuth,
    _data_dir: TempDir,
}

impl TestServer {
    pub fn new() -> Self {
        let data_dir = TempDir::new().expect("create temp data dir");

        let identity =
            IdentityStore::open(data_dir.path().join("users.db")).expect("open identity store");
        let stores = TenantStores::new(data_dir.path(), Duration::from_secs(5));
        // No API key: model-backed endpoints answer 503 in tests.
        let llm = LlmClient::new(LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4".to_string(),
            transcribe_model: "whisper-1".to_string(),
        });

        Self {
            ctx: Arc::new(AppContext::new(identity, stores, llm)),
            jwt: JwtAuth::new(TEST_JWT_SECRET, 24),
            _data_dir: data_dir,
        }
    }

    pub fn context_data(&self) -> web::Data<Arc<AppContext>> {
        web::Data::new(self.ctx.clone())
    }

    pub fn jwt_data(&self) -> web::Data<JwtAuth> {
        web::Data::new(self.jwt.clone())
    }
}

/// Build a single-part multipart/form-data body by hand.
///
/// Returns the `Content-Type` header value and the raw body bytes.
pub fn multipart_body(
    field_name: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "tabula-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}
