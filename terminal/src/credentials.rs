//! JSON credential store: API keys per exchange and account label.
//!
//! File layout:
//!
//! ```json
//! {"exchanges": {"binance": {"main": {"apiKey": "...", "secret": "...", "password": "..."}}}}
//! ```
//!
//! Unknown top-level keys are preserved on save.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// One API key pair as stored on disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiCredential {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub secret: Zeroizing<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("api_key", &mask_key(&self.api_key))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    exchanges: BTreeMap<String, BTreeMap<String, ApiCredential>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// A configured (exchange, account label) pair with its secrets.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub exchange: String,
    pub label: String,
    pub credential: ApiCredential,
}

/// Credential file handle. Mutations are written back immediately.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    file: CredentialFile,
}

impl CredentialStore {
    /// Open the store, creating an empty file when none exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let store = Self {
                path: path.to_path_buf(),
                file: CredentialFile::default(),
            };
            store.save()?;
            log::info!("created empty credential file {}", path.display());
            return Ok(store);
        }

        let contents = fs::read_to_string(path).map_err(|e| Error::CredentialsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: CredentialFile = serde_json::from_str(&contents)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All accounts, sorted by exchange then label.
    pub fn list_accounts(&self) -> Vec<AccountRecord> {
        self.file
            .exchanges
            .iter()
            .flat_map(|(exchange, accounts)| {
                accounts.iter().map(move |(label, credential)| AccountRecord {
                    exchange: exchange.clone(),
                    label: label.clone(),
                    credential: credential.clone(),
                })
            })
            .collect()
    }

    pub fn get(&self, exchange: &str, label: &str) -> Option<AccountRecord> {
        let credential = self.file.exchanges.get(exchange)?.get(label)?;
        Some(AccountRecord {
            exchange: exchange.to_string(),
            label: label.to_string(),
            credential: credential.clone(),
        })
    }

    /// Add or replace an account.
    pub fn add(&mut self, exchange: &str, label: &str, credential: ApiCredential) -> Result<()> {
        if exchange.is_empty() || label.is_empty() {
            return Err(Error::Credentials(
                "exchange and account label must not be empty".into(),
            ));
        }
        if credential.api_key.is_empty() || credential.secret.is_empty() {
            return Err(Error::Credentials("API key and secret must not be empty".into()));
        }
        self.file
            .exchanges
            .entry(exchange.to_string())
            .or_default()
            .insert(label.to_string(), credential);
        self.save()
    }

    /// Remove an account. An exchange with no accounts left is dropped.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, exchange: &str, label: &str) -> Result<bool> {
        let Some(accounts) = self.file.exchanges.get_mut(exchange) else {
            return Ok(false);
        };
        if accounts.remove(label).is_none() {
            return Ok(false);
        }
        if accounts.is_empty() {
            self.file.exchanges.remove(exchange);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Hide the middle of an API key: first 4 and last 4 characters kept.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}
