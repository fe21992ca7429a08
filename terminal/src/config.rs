//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Settings applied to every exchange connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Route orders to the exchange's testnet.
    #[serde(default)]
    pub sandbox_mode: bool,
    /// HTTP(S) or SOCKS5 proxy URL.
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            sandbox_mode: false,
            proxy: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    /// Directory holding the per-account order CSV files.
    #[serde(default = "default_orders_dir")]
    pub orders_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            orders_dir: default_orders_dir(),
        }
    }
}

fn default_credentials_file() -> String {
    "credentials.json".into()
}
fn default_orders_dir() -> String {
    ".".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

const PROXY_SCHEMES: &[&str] = &["http://", "https://", "socks5://", "socks5h://"];

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.exchange.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if let Some(proxy) = &self.exchange.proxy {
            let host = PROXY_SCHEMES
                .iter()
                .find_map(|scheme| proxy.strip_prefix(scheme));
            match host {
                Some(rest) if !rest.is_empty() && !rest.starts_with('/') => {}
                _ => {
                    return Err(Error::Config(format!(
                        "proxy {proxy:?} must be an http(s):// or socks5:// URL"
                    )));
                }
            }
        }
        if self.storage.credentials_file.is_empty() {
            return Err(Error::Config("credentials_file must not be empty".into()));
        }
        if self.storage.orders_dir.is_empty() {
            return Err(Error::Config("orders_dir must not be empty".into()));
        }
        if self.logging.dir.is_empty() || self.logging.audit_file.is_empty() {
            return Err(Error::Config("logging paths must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.timeout_secs)
    }

    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.credentials_file)
    }

    pub fn orders_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.orders_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.dir)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[exchange]
sandbox_mode = true
proxy = "http://127.0.0.1:7890"
timeout_secs = 10

[storage]
credentials_file = "/etc/quicktrade/credentials.json"
orders_dir = "./orders"

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert!(config.exchange.sandbox_mode);
        assert_eq!(config.exchange.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.orders_dir(), PathBuf::from("./orders"));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(!config.exchange.sandbox_mode);
        assert!(config.exchange.proxy.is_none());
        assert_eq!(config.exchange.timeout_secs, 30);
        assert_eq!(config.credentials_path(), PathBuf::from("credentials.json"));
        assert_eq!(config.orders_dir(), PathBuf::from("."));
    }

    #[test]
    fn partial_section_fills_defaults() {
        let config = Config::from_toml("[exchange]\nsandbox_mode = true\n").unwrap();
        assert!(config.exchange.sandbox_mode);
        assert_eq!(config.exchange.timeout_secs, 30);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.exchange.timeout_secs, 30);
    }

    #[test]
    fn validate_catches_zero_timeout() {
        let mut config = Config::from_toml(example_toml()).unwrap();
        config.exchange.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_proxy() {
        let mut config = Config::from_toml(example_toml()).unwrap();
        config.exchange.proxy = Some("127.0.0.1:7890".into());
        assert!(config.validate().is_err());
        config.exchange.proxy = Some("socks5://localhost:1080".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn audit_path() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(
            config.audit_path(),
            std::path::PathBuf::from("./logs/audit.jsonl")
        );
    }

    #[test]
    fn unreadable_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[exchange\n"),
            Err(Error::ConfigParse(_))
        ));
    }
}
