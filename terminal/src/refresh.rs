//! Data refresh: pull ticker, balances, open orders and recent trades
//! for the active account and symbol.
//!
//! A refresh either succeeds and replaces the whole snapshot, or fails and
//! leaves the previous snapshot in place.

use chrono::{DateTime, Duration, Utc};
use log::{debug, error};
use quicktrade_broker::{Balances, Broker, GatewayError, OpenOrder, Ticker, Trade};

use crate::account::AccountHandle;

/// Trades older than this are not fetched.
pub const TRADE_LOOKBACK_HOURS: i64 = 24;

/// Point-in-time view of one account and symbol.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub ticker: Option<Ticker>,
    pub balances: Balances,
    /// Newest first.
    pub open_orders: Vec<OpenOrder>,
    /// Newest first.
    pub trades: Vec<Trade>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    pub fn last_price(&self) -> Option<rust_decimal::Decimal> {
        self.ticker.as_ref().map(|t| t.last)
    }
}

/// Start of the trade-history window for a refresh at `now`.
pub fn trades_since_ms(now: DateTime<Utc>) -> i64 {
    (now - Duration::hours(TRADE_LOOKBACK_HOURS)).timestamp_millis()
}

/// Fetch a full snapshot with four sequential gateway calls.
pub fn fetch_snapshot(
    broker: &dyn Broker,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<MarketSnapshot, GatewayError> {
    let ticker = broker.fetch_ticker(symbol)?;
    let balances = broker.fetch_balance()?;

    let mut open_orders = broker.fetch_open_orders(symbol)?;
    open_orders.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

    let mut trades = broker.fetch_my_trades(symbol, trades_since_ms(now))?;
    trades.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

    Ok(MarketSnapshot {
        ticker: Some(ticker),
        balances,
        open_orders,
        trades,
        fetched_at: Some(now),
    })
}

/// Owns the latest snapshot.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    snapshot: MarketSnapshot,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    /// Replace the snapshot with fresh data. On error the previous snapshot is kept.
    pub fn refresh(
        &mut self,
        account: &AccountHandle,
        symbol: &str,
    ) -> Result<&MarketSnapshot, GatewayError> {
        match fetch_snapshot(account.broker(), symbol, Utc::now()) {
            Ok(snapshot) => {
                debug!(
                    "Refreshed {account} {symbol}: last={:?} {} open orders, {} trades",
                    snapshot.last_price(),
                    snapshot.open_orders.len(),
                    snapshot.trades.len()
                );
                self.snapshot = snapshot;
                Ok(&self.snapshot)
            }
            Err(e) => {
                error!("Refresh failed for {account} {symbol} ({}): {e}", e.kind());
                Err(e)
            }
        }
    }

    /// Forget everything, e.g. after switching account or symbol.
    pub fn clear(&mut self) {
        self.snapshot = MarketSnapshot::default();
    }
}
