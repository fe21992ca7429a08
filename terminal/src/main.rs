//! CLI entry point for the quicktrade terminal.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use quicktrade_terminal::commands;
use quicktrade_terminal::config::Config;
use quicktrade_terminal::error::Error;

#[derive(Parser)]
#[command(name = "quicktrade")]
#[command(about = "Manual limit-order trading in the terminal")]
#[command(version)]
struct Cli {
    /// Path to quicktrade.toml
    #[arg(long, default_value = "quicktrade.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive trading session (default)
    Trade,

    /// Manage exchange accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
}

#[derive(Subcommand)]
enum AccountsCommand {
    /// List configured accounts with masked keys
    List,

    /// Add or replace an account interactively
    Add,

    /// Remove an account
    Remove {
        exchange: String,
        label: String,

        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Connect and show balances
    Test { exchange: String, label: String },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Trade) {
        Command::Trade => commands::trade(&config)?,
        Command::Accounts { command } => match command {
            AccountsCommand::List => commands::accounts_list(&config)?,
            AccountsCommand::Add => commands::accounts_add(&config)?,
            AccountsCommand::Remove {
                exchange,
                label,
                yes,
            } => commands::accounts_remove(&config, &exchange, &label, yes)?,
            AccountsCommand::Test { exchange, label } => {
                commands::accounts_test(&config, &exchange, &label)?
            }
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<Error>() {
            Some(Error::NoAccounts) => {
                eprintln!("{e}");
                process::exit(2);
            }
            Some(Error::Gateway(_)) => {
                eprintln!("Error: {e:#}");
                process::exit(3);
            }
            _ => {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
        }
    }
}
