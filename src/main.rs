// Tabula server entrypoint
//!
//! The heavy lifting (initialization, middleware wiring, graceful shutdown)
//! lives in dedicated modules so this file remains a thin orchestrator.

use anyhow::Result;
use log::info;
use tabula_server::config::ServerConfig;
use tabula_server::lifecycle::{bootstrap, run};
use tabula_server::logging;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (environment variables override file values)
    let config_path = "config.toml";
    let config = match ServerConfig::from_file(config_path) {
        Ok(cfg) => {
            eprintln!(
                "Loaded config from: {}",
                std::fs::canonicalize(config_path)
                    .unwrap_or_else(|_| std::path::PathBuf::from(config_path))
                    .display()
            );
            cfg
        }
        Err(e) => {
            eprintln!("FATAL: Failed to load config.toml: {}", e);
            eprintln!("Server cannot start without valid configuration");
            std::process::exit(1);
        }
    };

    // Logging before any other side effects
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
        &config.logging.format,
    )?;

    info!("Tabula Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Host: {}  Port: {}", config.server.host, config.server.port);

    // Build application state
    let app_context = bootstrap(&config)?;

    // Run HTTP server until termination signal is received
    run(&config, app_context).await
}
