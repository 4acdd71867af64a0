use config::{Config, ConfigError, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

pub use lumen_common::config::StorageConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Extra connection attempts after the first failure. Default: 3.
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u8,
    /// Base delay for exponential backoff between attempts. Default: 2000.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

fn default_connect_retries() -> u8 {
    3
}
fn default_retry_base_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// One of `HS256`, `HS384`, `HS512`. Default: `HS256`.
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    /// Token lifetime. Default: 1440 (24 hours).
    #[serde(default = "default_jwt_expires_minutes")]
    pub jwt_expires_minutes: i64,
}

fn default_jwt_algorithm() -> String {
    "HS256".into()
}
fn default_jwt_expires_minutes() -> i64 {
    60 * 24
}

impl AuthConfig {
    /// Parse `jwt_algorithm`, accepting only HMAC variants.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        match self.jwt_algorithm.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(ConfigError::Message(format!(
                "unsupported auth.jwt_algorithm '{other}' (expected HS256, HS384 or HS512)"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Body limit for the upload route. Default: 200 MiB.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Per-file ceiling on buffered bytes, independent of collection settings.
    /// Default: 50 MiB.
    #[serde(default = "default_hard_file_limit")]
    pub hard_file_limit: u64,
}

fn default_max_request_bytes() -> usize {
    200 * 1024 * 1024
}
fn default_hard_file_limit() -> u64 {
    50 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: default_max_request_bytes(),
            hard_file_limit: default_hard_file_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// The default admin is only seeded when this is set.
    pub password: Option<String>,
}

fn default_admin_username() -> String {
    "admin".into()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default(
                "server.cors.allow_origins",
                vec!["http://localhost:5173", "http://localhost:5174"],
            )?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LUMEN__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("LUMEN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.auth.algorithm()?;
        Ok(config)
    }
}
