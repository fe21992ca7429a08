//! Account handles: one live gateway connection per configured credential.

use std::fmt;

use log::{error, info};
use quicktrade_broker::Broker;
use quicktrade_broker::binance::BinanceBroker;
use quicktrade_broker::binance::client::ClientOptions;
use quicktrade_broker::mock::MockBroker;

use crate::config::Config;
use crate::credentials::AccountRecord;
use crate::error::{Error, Result};

/// Exchange ids accepted by [`gateway_for`].
pub const SUPPORTED_EXCHANGES: &[&str] = &["binance", "paper"];

/// An (exchange, account label) pair bound to a connected gateway.
pub struct AccountHandle {
    exchange: String,
    label: String,
    broker: Box<dyn Broker>,
}

impl AccountHandle {
    pub fn new(exchange: &str, label: &str, broker: Box<dyn Broker>) -> Self {
        Self {
            exchange: exchange.to_string(),
            label: label.to_string(),
            broker,
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn broker(&self) -> &dyn Broker {
        self.broker.as_ref()
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exchange, self.label)
    }
}

impl fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountHandle")
            .field("exchange", &self.exchange)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Build an unconnected gateway for a credential record.
pub fn gateway_for(record: &AccountRecord, config: &Config) -> Result<Box<dyn Broker>> {
    match record.exchange.as_str() {
        "binance" => {
            let options = ClientOptions {
                sandbox: config.exchange.sandbox_mode,
                proxy: config.exchange.proxy.clone(),
                timeout: config.timeout(),
            };
            Ok(Box::new(BinanceBroker::new(
                &record.credential.api_key,
                &record.credential.secret,
                options,
            )))
        }
        "paper" => Ok(Box::new(MockBroker::paper())),
        other => Err(Error::UnsupportedExchange(other.to_string())),
    }
}

/// Connect one record.
pub fn connect_one<F>(record: &AccountRecord, factory: &mut F) -> Result<AccountHandle>
where
    F: FnMut(&AccountRecord) -> Result<Box<dyn Broker>>,
{
    let mut broker = factory(record)?;
    broker.connect()?;
    Ok(AccountHandle::new(&record.exchange, &record.label, broker))
}

/// Connect every record; records that fail are logged and skipped.
pub fn connect_all<F>(records: &[AccountRecord], mut factory: F) -> Vec<AccountHandle>
where
    F: FnMut(&AccountRecord) -> Result<Box<dyn Broker>>,
{
    let mut handles = Vec::with_capacity(records.len());
    for record in records {
        match connect_one(record, &mut factory) {
            Ok(handle) => {
                info!("Connected account {handle}");
                handles.push(handle);
            }
            Err(e) => {
                error!(
                    "Skipping account {}/{}: {e}",
                    record.exchange, record.label
                );
            }
        }
    }
    info!("{} of {} accounts usable", handles.len(), records.len());
    handles
}
