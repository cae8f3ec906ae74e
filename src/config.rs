// Configuration module
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub llm: LlmSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub security: SecuritySettings,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 0 means one worker per CPU core.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory holding users.db and all tenant directories.
    pub data_dir: String,
}

impl StorageSettings {
    /// Path of the shared account database.
    pub fn identity_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("users.db")
    }

    /// Directory under which per-tenant directories are created.
    pub fn tenant_root(&self) -> PathBuf {
        Path::new(&self.data_dir).join("tenants")
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: u64,
}

/// Query execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Per-statement wall-clock budget; 0 disables the timeout.
    #[serde(default = "default_query_timeout")]
    pub timeout_seconds: u64,
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Upstream model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Usually left empty here and supplied via OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_transcribe_model")]
    pub transcribe_model: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Security settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySettings {
    #[serde(default)]
    pub cors: CorsSettings,
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Empty or "*" allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_expiry_hours: default_token_expiry_hours(),
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_query_timeout(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            transcribe_model: default_transcribe_model(),
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            allow_credentials: false,
            max_age: default_cors_max_age(),
        }
    }
}

// Default value functions
fn default_workers() -> usize {
    0
}

fn default_jwt_secret() -> String {
    String::new()
}

fn default_token_expiry_hours() -> u64 {
    24
}

fn default_query_timeout() -> u64 {
    30
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4".to_string()
}

fn default_transcribe_model() -> String {
    "whisper-1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()]
}

fn default_cors_headers() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_max_age() -> u64 {
    3600
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides for sensitive configuration
    ///
    /// Supported environment variables:
    /// - TABULA_SERVER_HOST: Override server.host
    /// - TABULA_SERVER_PORT: Override server.port
    /// - TABULA_DATA_DIR: Override storage.data_dir
    /// - TABULA_JWT_SECRET: Override auth.jwt_secret
    /// - TABULA_LOG_LEVEL: Override logging.level
    /// - TABULA_LOG_FILE: Override logging.file_path
    /// - TABULA_LOG_TO_CONSOLE: Override logging.log_to_console
    /// - OPENAI_API_KEY: Override llm.api_key
    ///
    /// Environment variables take precedence over config.toml values.
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(host) = env::var("TABULA_SERVER_HOST") {
            self.server.host = host;
        }

        if let Ok(port_str) = env::var("TABULA_SERVER_PORT") {
            self.server.port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid TABULA_SERVER_PORT value: {}", port_str))?;
        }

        if let Ok(path) = env::var("TABULA_DATA_DIR") {
            self.storage.data_dir = path;
        }

        if let Ok(secret) = env::var("TABULA_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(level) = env::var("TABULA_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(path) = env::var("TABULA_LOG_FILE") {
            self.logging.file_path = path;
        }

        if let Ok(val) = env::var("TABULA_LOG_TO_CONSOLE") {
            self.logging.log_to_console =
                val.to_lowercase() == "true" || val == "1" || val.to_lowercase() == "yes";
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.data_dir cannot be empty"));
        }

        // Tokens signed with a guessable secret are forgeable.
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "auth.jwt_secret is required (set it in config.toml or via TABULA_JWT_SECRET)"
            ));
        }

        if self.auth.token_expiry_hours == 0 {
            return Err(anyhow::anyhow!("auth.token_expiry_hours cannot be 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("llm.base_url cannot be empty"));
        }

        Ok(())
    }

    /// Get default configuration (useful for testing)
    pub fn default_for_tests() -> Self {
        ServerConfig {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: 0,
            },
            storage: StorageSettings {
                data_dir: "./data".to_string(),
            },
            auth: AuthSettings {
                jwt_secret: "test-secret".to_string(),
                token_expiry_hours: 24,
            },
            query: QuerySettings::default(),
            llm: LlmSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                file_path: "./logs/server.log".to_string(),
                log_to_console: true,
                format: "compact".to_string(),
            },
            security: SecuritySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default_for_tests();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = ServerConfig::default_for_tests();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_jwt_secret_rejected() {
        let mut config = ServerConfig::default_for_tests();
        config.auth.jwt_secret = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ServerConfig::default_for_tests();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_paths() {
        let config = ServerConfig::default_for_tests();
        assert_eq!(config.storage.identity_path(), Path::new("./data/users.db"));
        assert_eq!(config.storage.tenant_root(), Path::new("./data/tenants"));
    }

    #[test]
    fn test_env_override_server_host() {
        env::set_var("TABULA_SERVER_HOST", "0.0.0.0");
        let mut config = ServerConfig::default_for_tests();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        env::remove_var("TABULA_SERVER_HOST");
    }

    #[test]
    fn test_env_override_server_port() {
        env::set_var("TABULA_SERVER_PORT", "9090");
        let mut config = ServerConfig::default_for_tests();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.server.port, 9090);
        env::remove_var("TABULA_SERVER_PORT");
    }

    #[test]
    fn test_env_override_invalid_port_rejected() {
        env::set_var("TABULA_SERVER_PORT", "not-a-port");
        let mut config = ServerConfig::default_for_tests();
        assert!(config.apply_env_overrides().is_err());
        env::remove_var("TABULA_SERVER_PORT");
    }

    #[test]
    fn test_env_override_jwt_secret() {
        env::set_var("TABULA_JWT_SECRET", "from-env");
        let mut config = ServerConfig::default_for_tests();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.auth.jwt_secret, "from-env");
        env::remove_var("TABULA_JWT_SECRET");
    }

    #[test]
    fn test_env_override_api_key() {
        env::set_var("OPENAI_API_KEY", "sk-test");
        let mut config = ServerConfig::default_for_tests();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.llm.api_key, "sk-test");
        env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 5000

            [storage]
            data_dir = "/var/lib/tabula"

            [auth]
            jwt_secret = "secret"

            [logging]
            file_path = "./logs/server.log"
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.query.timeout_seconds, 30);
        assert_eq!(config.llm.chat_model, "gpt-4");
        assert_eq!(config.llm.transcribe_model, "whisper-1");
        assert_eq!(config.auth.token_expiry_hours, 24);
    }
}
