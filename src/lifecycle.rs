//! Server lifecycle: state construction, HTTP server startup, and
//! graceful shutdown.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use log::info;

use tabula_api::{configure_routes, AppContext};
use tabula_auth::{IdentityStore, JwtAuth};
use tabula_llm::{LlmClient, LlmConfig};
use tabula_store::TenantStores;

use crate::config::ServerConfig;
use crate::middleware;

/// Build the shared application state from configuration.
///
/// Opens (and migrates, if new) the shared account database, prepares the
/// tenant store root, and constructs the upstream model client. Fails fast
/// so misconfiguration surfaces at startup rather than on first request.
pub fn bootstrap(config: &ServerConfig) -> Result<Arc<AppContext>> {
    let identity = IdentityStore::open(config.storage.identity_path())?;
    info!(
        "Account database ready at {}",
        config.storage.identity_path().display()
    );

    let stores = TenantStores::new(config.storage.tenant_root(), config.query.timeout());
    info!("Tenant store root: {}", stores.root().display());

    if config.llm.api_key.is_empty() {
        log::warn!("llm.api_key not set; /sql/generate and /transcribe will return 503");
    }
    let llm = LlmClient::new(LlmConfig {
        base_url: config.llm.base_url.clone(),
        api_key: config.llm.api_key.clone(),
        chat_model: config.llm.chat_model.clone(),
        transcribe_model: config.llm.transcribe_model.clone(),
    });

    Ok(Arc::new(AppContext::new(identity, stores, llm)))
}

/// Run the HTTP server until a termination signal is received.
pub async fn run(config: &ServerConfig, app_context: Arc<AppContext>) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let jwt = JwtAuth::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_expiry_hours as i64,
    );

    let cors_config = config.clone();
    let app_context_for_handler = app_context.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::request_logger())
            .wrap(middleware::build_cors_from_config(&cors_config))
            .app_data(web::Data::new(app_context_for_handler.clone()))
            .app_data(web::Data::new(jwt.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_addr)?;

    let server = server
        .workers(if config.server.workers == 0 {
            num_cpus::get()
        } else {
            config.server.workers
        })
        .run();

    info!("Listening on http://{}", bind_addr);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            if let Err(e) = result {
                log::error!("Server task failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
            server_handle.stop(true).await;
            info!("Shutdown complete");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_creates_account_database() {
        let dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default_for_tests();
        config.storage.data_dir = dir.path().to_string_lossy().into_owned();

        let ctx = bootstrap(&config).unwrap();
        assert!(dir.path().join("users.db").exists());
        assert_eq!(ctx.stores.root(), dir.path().join("tenants"));
    }
}
