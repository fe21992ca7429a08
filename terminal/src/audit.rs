//! JSONL audit trail logging.
//!
//! Each session appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::account::AccountHandle;
use crate::error::Result;
use crate::nav::Screen;
use crate::orders::{OrderRecord, OrderTicket};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log an event, reporting a write failure to the diagnostic log only.
    pub fn record(&mut self, event: &'static str, data: serde_json::Value) {
        if let Err(e) = self.log(event, data) {
            log::warn!("audit write failed for {event}: {e}");
        }
    }
}

pub fn log_session_started(audit: &mut AuditLog, accounts: &[AccountHandle]) {
    let ids: Vec<_> = accounts.iter().map(|a| a.to_string()).collect();
    audit.record("session_started", serde_json::json!({ "accounts": ids }));
}

pub fn log_session_stopped(audit: &mut AuditLog) {
    audit.record("session_stopped", serde_json::json!({}));
}

pub fn log_account_selected(audit: &mut AuditLog, account: &AccountHandle) {
    audit.record(
        "account_selected",
        serde_json::json!({ "exchange": account.exchange(), "account": account.label() }),
    );
}

pub fn log_symbol_selected(audit: &mut AuditLog, account: &AccountHandle, symbol: &str) {
    audit.record(
        "symbol_selected",
        serde_json::json!({ "account": account.to_string(), "symbol": symbol }),
    );
}

pub fn log_order_attempt(audit: &mut AuditLog, account: &AccountHandle, ticket: &OrderTicket) {
    audit.record(
        "order_submit_attempt",
        serde_json::json!({
            "account": account.to_string(),
            "symbol": ticket.symbol,
            "side": ticket.side.as_str(),
            "price": ticket.price.to_string(),
            "amount": ticket.amount.to_string(),
        }),
    );
}

pub fn log_order_placed(audit: &mut AuditLog, record: &OrderRecord) {
    audit.record(
        "order_submitted",
        serde_json::json!({
            "account": format!("{}/{}", record.exchange, record.account),
            "symbol": record.symbol,
            "order_id": record.order_id,
            "side": record.side.as_str(),
            "price": record.price.to_string(),
            "amount": record.amount.to_string(),
            "cost": record.cost.to_string(),
            "status": record.status,
        }),
    );
}

pub fn log_order_failed(audit: &mut AuditLog, account: &AccountHandle, symbol: &str, error: &str) {
    audit.record(
        "order_failed",
        serde_json::json!({ "account": account.to_string(), "symbol": symbol, "error": error }),
    );
}

pub fn log_cancel(
    audit: &mut AuditLog,
    account: &AccountHandle,
    order_id: &str,
    outcome: std::result::Result<bool, &str>,
) {
    let (event, detail) = match outcome {
        Ok(true) => ("order_cancelled", serde_json::Value::Null),
        Ok(false) => ("cancel_declined", serde_json::Value::Null),
        Err(e) => ("cancel_failed", serde_json::json!(e)),
    };
    audit.record(
        event,
        serde_json::json!({ "account": account.to_string(), "order_id": order_id, "error": detail }),
    );
}

pub fn log_navigation_error(audit: &mut AuditLog, screen: Screen, error: &str) {
    audit.record(
        "navigation_error",
        serde_json::json!({ "screen": screen.title(), "error": error }),
    );
}
