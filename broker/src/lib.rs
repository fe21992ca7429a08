//! Exchange gateway trait and implementations for quicktrade.
//!
//! Provides a generic `Broker` trait that abstracts over spot exchanges.
//! Implementations:
//!
//! - **Binance** (feature `binance`): Binance spot REST API
//! - **Paper** ([`mock::MockBroker::paper`]): in-memory exchange for demo sessions
//!
//! Symbols are unified `BASE/QUOTE` strings everywhere in this API.

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "binance")]
pub mod binance;

pub use error::GatewayError;
pub use types::*;

use quicktrade::Side;
use rust_decimal::Decimal;

/// A connection to one exchange account.
///
/// Every call is a single attempt; implementations never retry.
pub trait Broker {
    /// Exchange identifier, e.g. `binance`.
    fn exchange_id(&self) -> &str;

    /// Connect and verify credentials.
    fn connect(&mut self) -> Result<(), GatewayError>;

    /// All tradable markets with their precision rules.
    fn load_markets(&self) -> Result<Markets, GatewayError>;

    /// Last, bid and ask for a symbol.
    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, GatewayError>;

    /// Free/used/total per asset.
    fn fetch_balance(&self) -> Result<Balances, GatewayError>;

    /// Resting orders for a symbol.
    fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, GatewayError>;

    /// Own fills for a symbol since `since_ms` (Unix epoch milliseconds).
    fn fetch_my_trades(&self, symbol: &str, since_ms: i64) -> Result<Vec<Trade>, GatewayError>;

    /// Place a good-till-cancelled limit order.
    fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> Result<PlacedOrder, GatewayError>;

    /// Cancel a resting order.
    fn cancel_order(&self, id: &OrderId, symbol: &str) -> Result<(), GatewayError>;
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn exchange_id(&self) -> &str {
        (**self).exchange_id()
    }

    fn connect(&mut self) -> Result<(), GatewayError> {
        (**self).connect()
    }

    fn load_markets(&self) -> Result<Markets, GatewayError> {
        (**self).load_markets()
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, GatewayError> {
        (**self).fetch_ticker(symbol)
    }

    fn fetch_balance(&self) -> Result<Balances, GatewayError> {
        (**self).fetch_balance()
    }

    fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, GatewayError> {
        (**self).fetch_open_orders(symbol)
    }

    fn fetch_my_trades(&self, symbol: &str, since_ms: i64) -> Result<Vec<Trade>, GatewayError> {
        (**self).fetch_my_trades(symbol, since_ms)
    }

    fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> Result<PlacedOrder, GatewayError> {
        (**self).create_limit_order(symbol, side, amount, price)
    }

    fn cancel_order(&self, id: &OrderId, symbol: &str) -> Result<(), GatewayError> {
        (**self).cancel_order(id, symbol)
    }
}
