//! Bootstrap configuration loading
//!
//! One TOML file covers everything that must be known before the database is
//! open: where the database lives, which port to bind, where uploads and the
//! notification outcome log go, and how to reach the WhatsApp gateway.
//!
//! Resolution order:
//! 1. Explicit path (e.g. from `--config`) - must parse, errors are fatal
//! 2. `feira.toml` in the working directory, if present
//! 3. Compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default WhatsApp gateway endpoint for text messages.
pub const DEFAULT_WHATSAPP_ENDPOINT: &str =
    "https://sistema-whatsapp-api.5mos1l.easypanel.host/message/text";

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "feira.toml";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The application must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file (relative or absolute)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root directory for stored receipt files, served under `/uploads`
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,

    /// Directory for the notification outcome log (`whatsapp.log`)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// WhatsApp gateway configuration (optional)
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// WhatsApp gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Endpoint receiving `POST {to, text}` messages
    #[serde(default = "default_whatsapp_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds, applied to every send
    #[serde(default = "default_whatsapp_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("feira.db")
}

fn default_port() -> u16 {
    5741
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_whatsapp_endpoint() -> String {
    DEFAULT_WHATSAPP_ENDPOINT.to_string()
}

fn default_whatsapp_timeout_secs() -> u64 {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            endpoint: default_whatsapp_endpoint(),
            timeout_secs: default_whatsapp_timeout_secs(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            upload_root: default_upload_root(),
            log_dir: default_log_dir(),
            logging: LoggingConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Load configuration.
    ///
    /// An explicitly given path must exist and parse. Without one, a missing
    /// or unreadable `feira.toml` falls back to compiled defaults so a fresh
    /// checkout starts with zero configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            return toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            match std::fs::read_to_string(default_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Ignoring malformed {}: {}", DEFAULT_CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    warn!("Cannot read {}: {}", DEFAULT_CONFIG_FILE, e);
                }
            }
        }

        Ok(Self::default())
    }

    /// WhatsApp request timeout as a `Duration`
    pub fn whatsapp_timeout(&self) -> Duration {
        Duration::from_secs(self.whatsapp.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.database_path, PathBuf::from("feira.db"));
        assert_eq!(config.port, 5741);
        assert_eq!(config.upload_root, PathBuf::from("uploads"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.whatsapp.endpoint, DEFAULT_WHATSAPP_ENDPOINT);
        assert_eq!(config.whatsapp_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            database_path = "/tmp/test.db"

            [whatsapp]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.port, 5741);
        assert_eq!(config.whatsapp.timeout_secs, 3);
        assert_eq!(config.whatsapp.endpoint, DEFAULT_WHATSAPP_ENDPOINT);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let result = TomlConfig::load(Some(Path::new("/nonexistent/feira.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_path_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feira.toml");
        std::fs::write(&path, "port = 9000\n").unwrap();

        let config = TomlConfig::load(Some(&path)).unwrap();
        assert_eq!(config.port, 9000);
    }
}
