//! Order lifecycle: validate, submit, journal, cancel.
//!
//! An order is journaled only after the exchange has acknowledged it, and
//! an order that fails local validation never reaches the exchange. No call
//! is retried.

use chrono::Local;
use log::{error, info, warn};
use quicktrade::{Side, TradingCursor, ValidationError, check_order};
use quicktrade_broker::{GatewayError, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountHandle;
use crate::audit::{self, AuditLog};
use crate::journal::OrderJournal;

/// Timestamp format of the `timestamp` journal column, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One confirmed order, as written to the journal. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub timestamp: String,
    pub exchange: String,
    /// Account label. The column name is kept for compatibility with existing journals.
    #[serde(rename = "api_key")]
    pub account: String,
    pub symbol: String,
    pub order_id: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
    pub status: String,
}

/// What the user is about to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTicket {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    /// Minimum amount at the last observed price.
    pub minimum: Decimal,
}

impl OrderTicket {
    pub fn from_cursor(symbol: &str, cursor: &TradingCursor) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: cursor.side(),
            price: cursor.price(),
            amount: cursor.amount(),
            minimum: cursor.min_amount(),
        }
    }

    pub fn cost(&self) -> Decimal {
        self.price * self.amount
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The exchange accepted the order but the journal row could not be written.
    #[error("order {order_id} placed but not journaled: {source}")]
    Journal {
        order_id: String,
        source: crate::error::Error,
    },
}

/// Answer to a cancel prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    /// `y` confirms; any other key declines.
    pub fn from_key(c: Option<char>) -> Self {
        match c {
            Some('y') => Confirmation::Confirmed,
            _ => Confirmation::Declined,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderManager {
    journal: OrderJournal,
}

impl OrderManager {
    pub fn new(journal: OrderJournal) -> Self {
        Self { journal }
    }

    pub fn journal(&self) -> &OrderJournal {
        &self.journal
    }

    /// Validate and place a limit order, then journal it.
    pub fn submit(
        &self,
        account: &AccountHandle,
        ticket: &OrderTicket,
        audit: &mut AuditLog,
    ) -> Result<OrderRecord, OrderError> {
        if let Err(e) = check_order(ticket.price, ticket.amount, ticket.minimum) {
            warn!("Rejected {} {} locally: {e}", ticket.side, ticket.symbol);
            return Err(e.into());
        }

        audit::log_order_attempt(audit, account, ticket);
        info!(
            "Submitting {} {} {} @ {} on {account}",
            ticket.side, ticket.amount, ticket.symbol, ticket.price
        );

        let placed = match account.broker().create_limit_order(
            &ticket.symbol,
            ticket.side,
            ticket.amount,
            ticket.price,
        ) {
            Ok(placed) => placed,
            Err(e) => {
                error!("Order on {account} {} failed ({}): {e}", ticket.symbol, e.kind());
                audit::log_order_failed(audit, account, &ticket.symbol, &e.to_string());
                return Err(e.into());
            }
        };

        let record = OrderRecord {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            exchange: account.exchange().to_string(),
            account: account.label().to_string(),
            symbol: ticket.symbol.clone(),
            order_id: placed.id.0,
            side: ticket.side,
            price: ticket.price,
            amount: ticket.amount,
            cost: ticket.cost(),
            status: placed.status,
        };

        if let Err(source) = self.journal.append(&record) {
            error!("Order {} placed but journal write failed: {source}", record.order_id);
            return Err(OrderError::Journal {
                order_id: record.order_id,
                source,
            });
        }

        info!("Order {} {} on {account}", record.order_id, record.status);
        audit::log_order_placed(audit, &record);
        Ok(record)
    }

    /// Cancel a resting order once the user has confirmed.
    ///
    /// Returns `Ok(false)` without touching the exchange when declined.
    pub fn cancel(
        &self,
        account: &AccountHandle,
        symbol: &str,
        order_id: &OrderId,
        confirmation: Confirmation,
        audit: &mut AuditLog,
    ) -> Result<bool, GatewayError> {
        if confirmation == Confirmation::Declined {
            info!("Cancel of {order_id} declined");
            audit::log_cancel(audit, account, &order_id.0, Ok(false));
            return Ok(false);
        }

        match account.broker().cancel_order(order_id, symbol) {
            Ok(()) => {
                info!("Cancelled {order_id} on {account}");
                audit::log_cancel(audit, account, &order_id.0, Ok(true));
                Ok(true)
            }
            Err(e) => {
                error!("Cancel of {order_id} on {account} failed ({}): {e}", e.kind());
                audit::log_cancel(audit, account, &order_id.0, Err(&e.to_string()));
                Err(e)
            }
        }
    }
}
