//! Error types for the trading terminal.

use std::path::PathBuf;

use quicktrade::ValidationError;
use quicktrade_broker::GatewayError;

/// All errors that can occur outside a single order action.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("credential store error: {0}")]
    Credentials(String),

    #[error("failed to read credential file {path}: {source}")]
    CredentialsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse credential file: {0}")]
    CredentialsParse(#[from] serde_json::Error),

    #[error("unsupported exchange {0:?}")]
    UnsupportedExchange(String),

    #[error("no usable accounts: add one with `quicktrade accounts add`")]
    NoAccounts,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order journal error: {0}")]
    Journal(#[from] csv::Error),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
