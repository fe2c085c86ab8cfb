//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub reset: ResetConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "liftlog_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Password-reset notification settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetConfig {
    /// Endpoint that delivers reset emails. Notifications are skipped when unset.
    #[serde(default)]
    pub notify_url: Option<String>,

    /// Shared secret the mail service verifies `email_token` against.
    #[serde(default)]
    pub email_secret: String,
}

/// Static client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Directory holding the built web client. Served only if it contains
    /// an `index.html`.
    #[serde(default = "default_client_dir")]
    pub dir: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3001
}

fn default_db_path() -> String {
    "liftlog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_client_dir() -> String {
    "client/build".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dir: default_client_dir(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist.
///
/// Environment variable overrides:
/// - `LIFTLOG_HOST`, `LIFTLOG_PORT` override `server.*`
/// - `LIFTLOG_DB_PATH` overrides `database.path`
/// - `LIFTLOG_LOG_LEVEL` overrides `logging.level`
/// - `LIFTLOG_LOG_JSON` overrides `logging.json` ("true" or "1" to enable)
/// - `LIFTLOG_RESET_NOTIFY_URL` overrides `reset.notify_url`
/// - `LIFTLOG_EMAIL_SECRET` overrides `reset.email_secret`
/// - `LIFTLOG_CLIENT_DIR` overrides `client.dir`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => parse_config(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parses TOML text into a [`Config`].
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(contents)?)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(parsed) = var("LIFTLOG_HOST").and_then(|h| h.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = var("LIFTLOG_PORT").and_then(|p| p.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(db_path) = var("LIFTLOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("LIFTLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("LIFTLOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(url) = var("LIFTLOG_RESET_NOTIFY_URL") {
        config.reset.notify_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(secret) = var("LIFTLOG_EMAIL_SECRET") {
        config.reset.email_secret = secret;
    }
    if let Some(dir) = var("LIFTLOG_CLIENT_DIR") {
        config.client.dir = dir;
    }
}
