//! Command implementations behind the CLI.

use std::io::stdout;

use log::info;
use quicktrade_broker::{Broker, GatewayError};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use zeroize::Zeroizing;

use crate::account::{self, SUPPORTED_EXCHANGES};
use crate::app::App;
use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::credentials::{ApiCredential, CredentialStore, mask_key};
use crate::error::{Error, Result};
use crate::journal::OrderJournal;
use crate::logging;
use crate::orders::OrderManager;
use crate::term::{self, CrosstermInput, TerminalGuard};

/// Connect every account and run the interactive session.
pub fn trade(config: &Config) -> Result<()> {
    let log_path = logging::init(&config.log_dir())?;
    info!("Logging to {}", log_path.display());

    let store = CredentialStore::load(&config.credentials_path())?;
    let records = store.list_accounts();
    println!("Connecting {} account(s)...", records.len());
    let accounts = account::connect_all(&records, |r| account::gateway_for(r, config));
    if accounts.is_empty() {
        return Err(Error::NoAccounts);
    }

    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_session_started(&mut audit, &accounts);
    let orders = OrderManager::new(OrderJournal::new(&config.orders_dir()));
    let mut app = App::new(accounts, orders, audit);

    let result = {
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))
            .map_err(|e| Error::Terminal(e.to_string()))?;
        term::run_loop(&mut terminal, &mut app, &mut CrosstermInput)
    };

    audit::log_session_stopped(app.audit_mut());
    info!("Session ended");
    result
}

pub fn accounts_list(config: &Config) -> Result<()> {
    logging::init_stderr();
    let store = CredentialStore::load(&config.credentials_path())?;
    let accounts = store.list_accounts();
    if accounts.is_empty() {
        println!("No accounts in {}", store.path().display());
        return Ok(());
    }
    println!("{:<12} {:<16} API key", "Exchange", "Account");
    for a in accounts {
        println!(
            "{:<12} {:<16} {}",
            a.exchange,
            a.label,
            mask_key(&a.credential.api_key)
        );
    }
    Ok(())
}

pub fn accounts_add(config: &Config) -> Result<()> {
    logging::init_stderr();
    let mut store = CredentialStore::load(&config.credentials_path())?;

    let exchange = dialoguer::Select::new()
        .with_prompt("Exchange")
        .items(SUPPORTED_EXCHANGES)
        .default(0)
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()))?;
    let exchange = SUPPORTED_EXCHANGES[exchange];

    let label: String = dialoguer::Input::new()
        .with_prompt("Account label")
        .interact_text()
        .map_err(|e| Error::Prompt(e.to_string()))?;
    let api_key: String = dialoguer::Input::new()
        .with_prompt("API key")
        .interact_text()
        .map_err(|e| Error::Prompt(e.to_string()))?;
    let secret = dialoguer::Password::new()
        .with_prompt("Secret")
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()))?;
    let password = dialoguer::Password::new()
        .with_prompt("Password (optional)")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()))?;

    let credential = ApiCredential {
        api_key: api_key.trim().to_string(),
        secret: Zeroizing::new(secret),
        password: (!password.is_empty()).then(|| Zeroizing::new(password)),
    };
    store.add(exchange, label.trim(), credential)?;
    println!("Saved {exchange}/{} to {}", label.trim(), store.path().display());
    Ok(())
}

pub fn accounts_remove(config: &Config, exchange: &str, label: &str, yes: bool) -> Result<()> {
    logging::init_stderr();
    let mut store = CredentialStore::load(&config.credentials_path())?;
    if store.get(exchange, label).is_none() {
        return Err(Error::Credentials(format!("no account {exchange}/{label}")));
    }

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {exchange}/{label}?"))
            .default(false)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.remove(exchange, label)?;
    println!("Removed {exchange}/{label}");
    Ok(())
}

/// Connect one account and print its non-zero balances.
pub fn accounts_test(config: &Config, exchange: &str, label: &str) -> Result<()> {
    logging::init_stderr();
    let store = CredentialStore::load(&config.credentials_path())?;
    let record = store
        .get(exchange, label)
        .ok_or_else(|| Error::Credentials(format!("no account {exchange}/{label}")))?;

    print!("Connecting to {exchange}/{label}... ");
    let mut broker = account::gateway_for(&record, config)?;
    let balances = broker.connect().and_then(|()| broker.fetch_balance());
    let balances = match balances {
        Ok(b) => b,
        Err(e) => {
            println!("FAILED");
            match &e {
                GatewayError::Network(_) => eprintln!("Network problem, check connectivity or proxy"),
                GatewayError::Auth(_) => eprintln!("Credentials were rejected"),
                GatewayError::Exchange(_) | GatewayError::Unknown(_) => {
                    eprintln!("The exchange refused the request")
                }
            }
            return Err(e.into());
        }
    };
    println!("OK");

    let mut any = false;
    for b in balances.non_zero() {
        println!("  {:<10} {}", b.asset, b.total);
        any = true;
    }
    if !any {
        println!("  (no balances)");
    }
    Ok(())
}
