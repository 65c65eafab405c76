//! Configuration module for mmiv.

use serde::Deserialize;
use std::path::Path;

use crate::{MmivError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1759
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/mmiv.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Image upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Directory uploaded images are written to.
    #[serde(default = "default_uploads_path")]
    pub path: String,
    /// Maximum request size for uploads, in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_uploads_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl UploadsConfig {
    /// Upload ceiling in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            path: default_uploads_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Emoticon rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmoticonsConfig {
    /// URL prefix emoticon images are served under.
    #[serde(default = "default_emoticon_prefix")]
    pub url_prefix: String,
}

fn default_emoticon_prefix() -> String {
    "/static/img/emoticons".to_string()
}

impl Default for EmoticonsConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_emoticon_prefix(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_duration")]
    pub duration_secs: u64,
    /// Interval between expired-session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_session_duration() -> u64 {
    crate::auth::DEFAULT_SESSION_DURATION_SECS
}

fn default_cleanup_interval() -> u64 {
    600
}

fn default_cookie_name() -> String {
    "userSessionToken".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_session_duration(),
            cleanup_interval_secs: default_cleanup_interval(),
            cookie_name: default_cookie_name(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty means console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mmiv.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web front configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Serve the static front-end from `static_path`.
    #[serde(default)]
    pub serve_static: bool,
    /// Directory holding the static front-end.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_static_path() -> String {
    "static".to_string()
}

/// Initial moderator account, created when the user table is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Left empty to skip bootstrapping.
    #[serde(default)]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub emoticons: EmoticonsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(MmivError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, then apply `.env` and environment overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MmivError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// A `.env` file in the working directory is read first, if present.
    ///
    /// Supported environment variables:
    /// - `SERVER_ADDRESS`: bind host
    /// - `SERVER_PORT`: bind port
    /// - `MMIV_DATABASE_PATH`: SQLite file
    /// - `MMIV_ADMIN_PASSWORD`: bootstrap moderator password
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_ADDRESS") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SERVER_PORT"),
            }
        }
        if let Some(path) = get("MMIV_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(password) = get("MMIV_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(MmivError::Config("server.port must not be 0".to_string()));
        }
        if self.uploads.max_upload_size_mb == 0 {
            return Err(MmivError::Config(
                "uploads.max_upload_size_mb must be at least 1".to_string(),
            ));
        }
        if self.uploads.path.trim().is_empty() {
            return Err(MmivError::Config("uploads.path must be set".to_string()));
        }
        if self.session.duration_secs == 0 {
            return Err(MmivError::Config(
                "session.duration_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 1759);
        assert_eq!(config.database.path, "data/mmiv.db");
        assert_eq!(config.uploads.path, "uploads");
        assert_eq!(config.uploads.max_upload_size_mb, 10);
        assert_eq!(config.uploads.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.emoticons.url_prefix, "/static/img/emoticons");
        assert_eq!(config.session.duration_secs, 24 * 60 * 60);
        assert_eq!(config.session.cookie_name, "userSessionToken");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/mmiv.log");
        assert!(!config.web.serve_static);
        assert_eq!(config.admin.username, "admin");
        assert!(config.admin.password.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
path = "/var/lib/mmiv/board.db"

[uploads]
path = "/var/lib/mmiv/uploads"
max_upload_size_mb = 4

[emoticons]
url_prefix = "/emotes"

[session]
duration_secs = 3600
cleanup_interval_secs = 60
cookie_name = "sid"

[logging]
level = "debug"
file = ""

[web]
cors_origins = ["http://localhost:5173"]
serve_static = true
static_path = "public"

[admin]
username = "root"
password = "correct horse"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/var/lib/mmiv/board.db");
        assert_eq!(config.uploads.path, "/var/lib/mmiv/uploads");
        assert_eq!(config.uploads.max_upload_size_mb, 4);
        assert_eq!(config.emoticons.url_prefix, "/emotes");
        assert_eq!(config.session.duration_secs, 3600);
        assert_eq!(config.session.cleanup_interval_secs, 60);
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_empty());
        assert_eq!(config.web.cors_origins, vec!["http://localhost:5173"]);
        assert!(config.web.serve_static);
        assert_eq!(config.web.static_path, "public");
        assert_eq!(config.admin.username, "root");
        assert_eq!(config.admin.password, "correct horse");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9999
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.uploads.max_upload_size_mb, 10);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 1759);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server]\nport = \"not a number\"");

        if let Err(MmivError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(MmivError::Io(_))));
    }

    #[test]
    fn test_overrides_apply_non_empty_values() {
        let vars: HashMap<&str, &str> = [
            ("SERVER_ADDRESS", "0.0.0.0"),
            ("SERVER_PORT", "8081"),
            ("MMIV_DATABASE_PATH", "/tmp/board.db"),
            ("MMIV_ADMIN_PASSWORD", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.admin.password = "from-file".to_string();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.database.path, "/tmp/board.db");
        assert_eq!(config.admin.password, "from-file");
    }

    #[test]
    fn test_overrides_ignore_bad_port() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| (key == "SERVER_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 1759);
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.uploads.max_upload_size_mb = 0;
        assert!(matches!(config.validate(), Err(MmivError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_session_duration() {
        let mut config = Config::default();
        config.session.duration_secs = 0;
        assert!(config.validate().is_err());
    }
}
