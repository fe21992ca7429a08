//! Mock exchange implementing the `Broker` trait with configurable behavior.
//!
//! Use this in integration tests to simulate exchange responses without
//! network calls, and as the `paper` exchange for demo sessions. Clones share
//! state, so a test can keep one handle for assertions while another is
//! owned by the code under test.
//!
//! ```
//! use quicktrade::{MarketDescriptor, Side};
//! use quicktrade_broker::Broker;
//! use quicktrade_broker::mock::{Call, MockBroker};
//! use rust_decimal_macros::dec;
//!
//! let market = MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.001), dec!(10)).unwrap();
//! let mut broker = MockBroker::builder()
//!     .with_market(market)
//!     .with_ticker("BTC/USDT", dec!(100), dec!(99.99), dec!(100.01))
//!     .with_balance("USDT", dec!(1000), dec!(0))
//!     .build();
//! broker.connect().unwrap();
//!
//! broker.create_limit_order("BTC/USDT", Side::Buy, dec!(0.101), dec!(100)).unwrap();
//! assert_eq!(broker.calls(Call::CreateLimitOrder), 1);
//! assert_eq!(broker.fetch_open_orders("BTC/USDT").unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use quicktrade::{MarketDescriptor, Side, unified_symbol};
use rust_decimal::Decimal;

use crate::Broker;
use crate::error::GatewayError;
use crate::types::*;

/// How the mock exchange handles new orders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Orders rest on the book until cancelled.
    Rest,
    /// Orders fill immediately at their limit price.
    Fill,
    /// All orders are rejected.
    Reject,
}

/// Gateway operations, for call counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Call {
    Connect,
    LoadMarkets,
    FetchTicker,
    FetchBalance,
    FetchOpenOrders,
    FetchMyTrades,
    CreateLimitOrder,
    CancelOrder,
}

/// A recorded order submission for assertion in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedOrder {
    pub symbol: String,
    pub side: Side,
    pub amount: Decimal,
    pub price: Decimal,
}

struct State {
    connected: bool,
    fill_mode: FillMode,
    markets: Markets,
    tickers: BTreeMap<String, Ticker>,
    balances: Vec<Balance>,
    open_orders: Vec<OpenOrder>,
    trades: Vec<Trade>,
    next_failures: Vec<(Call, GatewayError)>,
    sticky_failures: Vec<(Call, GatewayError)>,
    calls: Vec<Call>,
    submitted: Vec<RecordedOrder>,
    next_order_id: u64,
    clock_ms: i64,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock_ms += 1_000;
        self.clock_ms
    }

    fn next_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        OrderId(id.to_string())
    }
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    exchange_id: String,
    fill_mode: FillMode,
    markets: Markets,
    tickers: BTreeMap<String, Ticker>,
    balances: Vec<Balance>,
    open_orders: Vec<(String, Side, Decimal, Decimal)>,
    trades: Vec<(String, Side, Decimal, Decimal)>,
    clock_ms: i64,
}

impl MockBrokerBuilder {
    pub fn exchange_id(mut self, id: &str) -> Self {
        self.exchange_id = id.to_string();
        self
    }

    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    pub fn with_market(mut self, market: MarketDescriptor) -> Self {
        self.markets.insert(market.symbol.clone(), market);
        self
    }

    pub fn with_ticker(mut self, symbol: &str, last: Decimal, bid: Decimal, ask: Decimal) -> Self {
        self.tickers.insert(
            symbol.to_string(),
            Ticker {
                symbol: symbol.to_string(),
                last,
                bid: Some(bid),
                ask: Some(ask),
            },
        );
        self
    }

    pub fn with_balance(mut self, asset: &str, free: Decimal, used: Decimal) -> Self {
        self.balances.push(Balance::new(asset, free, used));
        self
    }

    /// A resting order, timestamped after every previously added one.
    pub fn with_open_order(
        mut self,
        symbol: &str,
        side: Side,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        self.open_orders.push((symbol.to_string(), side, price, amount));
        self
    }

    /// A past fill, timestamped after every previously added one.
    pub fn with_trade(mut self, symbol: &str, side: Side, price: Decimal, amount: Decimal) -> Self {
        self.trades.push((symbol.to_string(), side, price, amount));
        self
    }

    /// Start the mock clock at `ms`; each order or trade advances it one second.
    pub fn clock(mut self, ms: i64) -> Self {
        self.clock_ms = ms;
        self
    }

    pub fn build(self) -> MockBroker {
        let mut state = State {
            connected: false,
            fill_mode: self.fill_mode,
            markets: self.markets,
            tickers: self.tickers,
            balances: self.balances,
            open_orders: Vec::new(),
            trades: Vec::new(),
            next_failures: Vec::new(),
            sticky_failures: Vec::new(),
            calls: Vec::new(),
            submitted: Vec::new(),
            next_order_id: 1,
            clock_ms: self.clock_ms,
        };
        for (symbol, side, price, amount) in self.open_orders {
            let id = state.next_id();
            let timestamp_ms = state.tick();
            state.open_orders.push(OpenOrder {
                id,
                symbol,
                order_type: "limit".into(),
                side,
                price,
                amount,
                timestamp_ms,
            });
        }
        for (n, (symbol, side, price, amount)) in self.trades.into_iter().enumerate() {
            let order_id = state.next_id();
            let timestamp_ms = state.tick();
            state.trades.push(Trade {
                id: format!("t{}", n + 1),
                order_id,
                symbol,
                side,
                price,
                amount,
                timestamp_ms,
            });
        }
        MockBroker {
            exchange_id: self.exchange_id,
            state: Arc::new(Mutex::new(state)),
        }
    }
}

/// A mock exchange that records calls and returns configurable responses.
#[derive(Clone)]
pub struct MockBroker {
    exchange_id: String,
    state: Arc<Mutex<State>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            exchange_id: "mock".into(),
            fill_mode: FillMode::Rest,
            markets: Markets::new(),
            tickers: BTreeMap::new(),
            balances: Vec::new(),
            open_orders: Vec::new(),
            trades: Vec::new(),
            clock_ms: now_ms() - 3_600_000,
        }
    }

    /// The `paper` exchange: a few liquid markets and a funded account.
    pub fn paper() -> MockBroker {
        let dec = Decimal::new;
        Self::builder()
            .exchange_id("paper")
            .with_market(market("BTC", "USDT", dec(1, 2), dec(1, 5), dec(5, 0)))
            .with_market(market("ETH", "USDT", dec(1, 2), dec(1, 4), dec(5, 0)))
            .with_market(market("SOL", "USDT", dec(1, 2), dec(1, 3), dec(5, 0)))
            .with_market(market("ETH", "BTC", dec(1, 5), dec(1, 4), dec(1, 4)))
            .with_ticker("BTC/USDT", dec(6500000, 2), dec(6499999, 2), dec(6500001, 2))
            .with_ticker("ETH/USDT", dec(320000, 2), dec(319999, 2), dec(320001, 2))
            .with_ticker("SOL/USDT", dec(15000, 2), dec(14999, 2), dec(15001, 2))
            .with_ticker("ETH/BTC", dec(4923, 5), dec(4922, 5), dec(4924, 5))
            .with_balance("USDT", dec(10_000, 0), Decimal::ZERO)
            .with_balance("BTC", dec(5, 1), Decimal::ZERO)
            .with_balance("ETH", dec(2, 0), Decimal::ZERO)
            .build()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next call of kind `call` with `error`.
    pub fn fail_next(&self, call: Call, error: GatewayError) {
        self.lock().next_failures.push((call, error));
    }

    /// Fail every call of kind `call` with `error` until [`Self::clear_failures`].
    pub fn fail_always(&self, call: Call, error: GatewayError) {
        self.lock().sticky_failures.push((call, error));
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.next_failures.clear();
        state.sticky_failures.clear();
    }

    /// Number of calls of kind `call` made so far, failed ones included.
    pub fn calls(&self, call: Call) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Get all orders that were submitted (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<RecordedOrder> {
        self.lock().submitted.clone()
    }

    /// Move the last price of `symbol`.
    pub fn set_last_price(&self, symbol: &str, last: Decimal) {
        if let Some(ticker) = self.lock().tickers.get_mut(symbol) {
            ticker.last = last;
        }
    }

    pub fn set_fill_mode(&self, mode: FillMode) {
        self.lock().fill_mode = mode;
    }

    /// Record `call` and return the injected failure for it, if any.
    fn enter(&self, call: Call, needs_connection: bool) -> Result<MutexGuard<'_, State>, GatewayError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(pos) = state.next_failures.iter().position(|(c, _)| *c == call) {
            let (_, err) = state.next_failures.remove(pos);
            return Err(err);
        }
        if let Some((_, err)) = state.sticky_failures.iter().find(|(c, _)| *c == call) {
            return Err(err.clone());
        }
        if needs_connection && !state.connected {
            return Err(GatewayError::not_connected());
        }
        Ok(state)
    }
}

impl Broker for MockBroker {
    fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    fn connect(&mut self) -> Result<(), GatewayError> {
        let mut state = self.enter(Call::Connect, false)?;
        state.connected = true;
        Ok(())
    }

    fn load_markets(&self) -> Result<Markets, GatewayError> {
        let state = self.enter(Call::LoadMarkets, true)?;
        Ok(state.markets.clone())
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, GatewayError> {
        let state = self.enter(Call::FetchTicker, true)?;
        state
            .tickers
            .get(symbol)
            .cloned()
            .ok_or_else(|| GatewayError::Exchange(format!("unknown symbol {symbol}")))
    }

    fn fetch_balance(&self) -> Result<Balances, GatewayError> {
        let state = self.enter(Call::FetchBalance, true)?;
        Ok(Balances(state.balances.clone()))
    }

    fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, GatewayError> {
        let state = self.enter(Call::FetchOpenOrders, true)?;
        Ok(state
            .open_orders
            .iter()
            .filter(|o| o.symbol == symbol)
            .cloned()
            .collect())
    }

    fn fetch_my_trades(&self, symbol: &str, since_ms: i64) -> Result<Vec<Trade>, GatewayError> {
        let state = self.enter(Call::FetchMyTrades, true)?;
        Ok(state
            .trades
            .iter()
            .filter(|t| t.symbol == symbol && t.timestamp_ms >= since_ms)
            .cloned()
            .collect())
    }

    fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> Result<PlacedOrder, GatewayError> {
        let mut state = self.enter(Call::CreateLimitOrder, true)?;

        // Record the order
        state.submitted.push(RecordedOrder {
            symbol: symbol.to_string(),
            side,
            amount,
            price,
        });

        if !state.markets.contains_key(symbol) {
            return Err(GatewayError::Exchange(format!("unknown symbol {symbol}")));
        }

        let mode = state.fill_mode.clone();
        if mode == FillMode::Reject {
            return Err(GatewayError::Exchange("mock: order rejected".into()));
        }
        let id = state.next_id();
        let timestamp_ms = state.tick();

        if mode == FillMode::Fill {
            let trade_id = format!("t{}", state.trades.len() + 1);
            state.trades.push(Trade {
                id: trade_id,
                order_id: id.clone(),
                symbol: symbol.to_string(),
                side,
                price,
                amount,
                timestamp_ms,
            });
            return Ok(PlacedOrder {
                id,
                status: "closed".into(),
            });
        }

        state.open_orders.push(OpenOrder {
            id: id.clone(),
            symbol: symbol.to_string(),
            order_type: "limit".into(),
            side,
            price,
            amount,
            timestamp_ms,
        });
        Ok(PlacedOrder {
            id,
            status: "open".into(),
        })
    }

    fn cancel_order(&self, id: &OrderId, symbol: &str) -> Result<(), GatewayError> {
        let mut state = self.enter(Call::CancelOrder, true)?;
        let pos = state
            .open_orders
            .iter()
            .position(|o| &o.id == id && o.symbol == symbol)
            .ok_or_else(|| GatewayError::Exchange(format!("order {id} not found")))?;
        state.open_orders.remove(pos);
        Ok(())
    }
}

fn market(
    base: &str,
    quote: &str,
    price_step: Decimal,
    amount_step: Decimal,
    min_notional: Decimal,
) -> MarketDescriptor {
    MarketDescriptor {
        symbol: unified_symbol(base, quote),
        base: base.to_string(),
        quote: quote.to_string(),
        price_step,
        amount_step,
        min_notional,
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}
