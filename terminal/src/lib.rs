//! quicktrade-terminal: interactive terminal for manual limit-order trading.
//!
//! Pick an account, pick a market, nudge price and amount in exchange-sized
//! steps, and submit limit orders while watching balances, open orders and
//! recent fills. Every order the exchange accepts is appended to a per-account
//! CSV journal.
//!
//! The session is a single-threaded loop: render, block for one key, act,
//! refresh when the action needs current numbers. See [`app::App`] for the
//! state machine and [`nav::action_for`] for the key table.

pub mod account;
pub mod app;
pub mod audit;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod journal;
pub mod logging;
pub mod nav;
pub mod orders;
pub mod refresh;
pub mod term;
pub mod ui;
