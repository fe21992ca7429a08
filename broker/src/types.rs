//! Shared gateway types: tickers, balances, orders, trades.

use std::collections::BTreeMap;
use std::fmt;

use quicktrade::{MarketDescriptor, Side};
use rust_decimal::Decimal;

/// Tradable markets keyed by unified symbol, sorted.
pub type Markets = BTreeMap<String, MarketDescriptor>;

/// Latest prices for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    pub symbol: String,
    pub last: Decimal,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
}

/// Holdings of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    /// Locked in open orders.
    pub used: Decimal,
    pub total: Decimal,
}

impl Balance {
    pub fn new(asset: &str, free: Decimal, used: Decimal) -> Self {
        Self {
            asset: asset.to_string(),
            free,
            used,
            total: free + used,
        }
    }
}

/// All balances of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances(pub Vec<Balance>);

impl Balances {
    pub fn get(&self, asset: &str) -> Option<&Balance> {
        self.0.iter().find(|b| b.asset == asset)
    }

    /// Free amount of `asset`, zero when absent.
    pub fn free(&self, asset: &str) -> Decimal {
        self.get(asset).map_or(Decimal::ZERO, |b| b.free)
    }

    /// Entries with a positive total.
    pub fn non_zero(&self) -> impl Iterator<Item = &Balance> {
        self.0.iter().filter(|b| b.total > Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(s.to_string())
    }
}

/// A resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
    pub id: OrderId,
    pub symbol: String,
    /// Exchange order type, e.g. `limit`.
    pub order_type: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    /// Submission time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// An executed fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub id: String,
    pub order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    pub timestamp_ms: i64,
}

/// Exchange acknowledgement of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub id: OrderId,
    /// Exchange status string, e.g. `open`, `NEW`, `FILLED`.
    pub status: String,
}
