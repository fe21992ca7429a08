//! Session context: the navigation state machine and everything it drives.
//!
//! [`App`] owns the connected accounts, the current [`Screen`], the trading
//! cursor, the market snapshot, and the order manager. One key press is one
//! transition; any error raised while handling it is logged, audited, and
//! shown as a one-line banner without leaving the current screen.

use log::{debug, error, info};
use quicktrade::{
    MarketDescriptor, Side, TradingCursor, ValidationError, precision, rescale_precision,
    reset_cursor, step_amount, step_price,
};
use quicktrade_broker::{Markets, OpenOrder, OrderId};
use ratatui::crossterm::event::KeyEvent;

use crate::account::AccountHandle;
use crate::audit::{self, AuditLog};
use crate::error::Result;
use crate::nav::{self, Action, Screen};
use crate::orders::{Confirmation, OrderManager, OrderTicket};
use crate::refresh::{MarketSnapshot, RefreshCoordinator};

/// Open orders shown, and selectable, on the open-orders screen.
pub const OPEN_ORDER_ROWS: usize = 15;

/// One-line message under the current screen, cleared by the next key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error(String),
    Info(String),
}

pub struct App {
    accounts: Vec<AccountHandle>,
    screen: Screen,
    account_index: usize,
    active: Option<usize>,
    markets: Markets,
    filter: String,
    symbol_index: usize,
    market: Option<MarketDescriptor>,
    cursor: Option<TradingCursor>,
    refresh: RefreshCoordinator,
    orders: OrderManager,
    audit: AuditLog,
    order_index: usize,
    pending_cancel: Option<OpenOrder>,
    banner: Option<Banner>,
    running: bool,
}

impl App {
    pub fn new(accounts: Vec<AccountHandle>, orders: OrderManager, audit: AuditLog) -> Self {
        Self {
            accounts,
            screen: Screen::AccountSelect,
            account_index: 0,
            active: None,
            markets: Markets::new(),
            filter: String::new(),
            symbol_index: 0,
            market: None,
            cursor: None,
            refresh: RefreshCoordinator::new(),
            orders,
            audit,
            order_index: 0,
            pending_cancel: None,
            banner: None,
            running: true,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn accounts(&self) -> &[AccountHandle] {
        &self.accounts
    }

    pub fn account_index(&self) -> usize {
        self.account_index
    }

    pub fn active_account(&self) -> Option<&AccountHandle> {
        self.active.map(|i| &self.accounts[i])
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Symbols whose name contains the filter, ignoring case.
    pub fn filtered_symbols(&self) -> Vec<&str> {
        let needle = self.filter.to_lowercase();
        self.markets
            .keys()
            .filter(|s| s.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn symbol_index(&self) -> usize {
        self.symbol_index
    }

    pub fn market(&self) -> Option<&MarketDescriptor> {
        self.market.as_ref()
    }

    pub fn cursor(&self) -> Option<&TradingCursor> {
        self.cursor.as_ref()
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        self.refresh.snapshot()
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }

    /// The order awaiting a `y` to be cancelled.
    pub fn pending_cancel(&self) -> Option<&OpenOrder> {
        self.pending_cancel.as_ref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn audit_mut(&mut self) -> &mut AuditLog {
        &mut self.audit
    }

    /// Record a failure at the action boundary and show it.
    pub fn report_error(&mut self, message: &str) {
        error!("{}: {message}", self.screen.title());
        audit::log_navigation_error(&mut self.audit, self.screen, message);
        self.banner = Some(Banner::Error(message.to_string()));
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.banner = None;

        if let Some(order) = self.pending_cancel.take() {
            self.answer_cancel(order, Confirmation::from_key(nav::key_char(key)));
            return;
        }

        let action = nav::action_for(self.screen, key);
        if action == Action::None {
            return;
        }
        if let Err(e) = self.apply(action) {
            self.report_error(&e.to_string());
        }
    }

    fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::None => Ok(()),
            Action::Quit => {
                info!("Quit requested on {}", self.screen.title());
                self.running = false;
                Ok(())
            }
            Action::Back => self.back(),
            Action::MoveUp => {
                self.move_selection(-1);
                Ok(())
            }
            Action::MoveDown => {
                self.move_selection(1);
                Ok(())
            }
            Action::Select => self.select(),
            Action::FilterPush(c) => {
                self.filter.push(c);
                self.symbol_index = 0;
                Ok(())
            }
            Action::FilterPop => {
                self.filter.pop();
                self.symbol_index = 0;
                Ok(())
            }
            Action::FilterClear => {
                self.filter.clear();
                self.symbol_index = 0;
                Ok(())
            }
            Action::StepPrice(direction) => {
                if let (Some(cursor), Some(market)) = (self.cursor.as_mut(), self.market.as_ref()) {
                    step_price(cursor, market, direction);
                    debug!("price {direction:?} -> {}", cursor.price());
                }
                Ok(())
            }
            Action::StepAmount(direction) => {
                if let (Some(cursor), Some(market)) = (self.cursor.as_mut(), self.market.as_ref()) {
                    step_amount(cursor, market, direction);
                    debug!("amount {direction:?} -> {}", cursor.amount());
                }
                Ok(())
            }
            Action::Rescale(rescale) => {
                if let Some(cursor) = self.cursor.as_mut() {
                    rescale_precision(cursor, rescale);
                    debug!("price multiplier {rescale:?} -> {}", cursor.price_multiplier());
                }
                Ok(())
            }
            Action::Reset => {
                self.refresh_snapshot()?;
                if let (Some(cursor), Some(market)) = (self.cursor.as_mut(), self.market.as_ref()) {
                    let last = self
                        .refresh
                        .snapshot()
                        .last_price()
                        .unwrap_or_else(|| cursor.price());
                    reset_cursor(cursor, market, last);
                    debug!("cursor reset to {} x {}", cursor.price(), cursor.amount());
                }
                Ok(())
            }
            Action::ToggleSide => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.toggle_side();
                    debug!("side -> {}", cursor.side());
                }
                Ok(())
            }
            Action::Submit => {
                self.submit();
                Ok(())
            }
            Action::Goto(Screen::SymbolSelect) => self.enter_symbol_select(),
            Action::Goto(screen) => self.enter(screen),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.screen {
            Screen::AccountSelect => (&mut self.account_index, self.accounts.len()),
            Screen::SymbolSelect => {
                let len = self.filtered_symbols().len();
                (&mut self.symbol_index, len)
            }
            Screen::OpenOrders => (
                &mut self.order_index,
                self.refresh.snapshot().open_orders.len().min(OPEN_ORDER_ROWS),
            ),
            _ => return,
        };
        if len == 0 {
            *index = 0;
            return;
        }
        *index = index.saturating_add_signed(delta).min(len - 1);
    }

    fn select(&mut self) -> Result<()> {
        match self.screen {
            Screen::AccountSelect => {
                if self.account_index >= self.accounts.len() {
                    return Err(ValidationError::EmptySelection.into());
                }
                self.active = Some(self.account_index);
                let account = &self.accounts[self.account_index];
                info!("Selected account {account}");
                audit::log_account_selected(&mut self.audit, account);
                self.enter_symbol_select()
            }
            Screen::SymbolSelect => self.select_symbol(),
            Screen::OpenOrders => {
                let order = self
                    .refresh
                    .snapshot()
                    .open_orders
                    .get(self.order_index)
                    .cloned()
                    .ok_or(ValidationError::EmptySelection)?;
                self.pending_cancel = Some(order);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn back(&mut self) -> Result<()> {
        match self.screen.parent() {
            None => {
                self.running = false;
                Ok(())
            }
            Some(Screen::AccountSelect) => {
                info!("Back to account selection");
                self.screen = Screen::AccountSelect;
                self.active = None;
                self.market = None;
                self.cursor = None;
                self.markets.clear();
                self.filter.clear();
                self.refresh.clear();
                Ok(())
            }
            Some(parent) => self.enter(parent),
        }
    }

    /// Load the market list for the active account. Stays put on failure.
    fn enter_symbol_select(&mut self) -> Result<()> {
        let Some(account) = self.active.map(|i| &self.accounts[i]) else {
            return Err(ValidationError::EmptySelection.into());
        };
        let markets = account.broker().load_markets()?;
        info!("Loaded {} markets for {account}", markets.len());

        self.markets = markets;
        self.filter.clear();
        let current = self
            .market
            .as_ref()
            .and_then(|m| self.filtered_symbols().iter().position(|s| *s == m.symbol));
        self.symbol_index = current.unwrap_or(0);
        self.screen = Screen::SymbolSelect;
        Ok(())
    }

    fn select_symbol(&mut self) -> Result<()> {
        let (Some(index), Some(symbol)) = (
            self.active,
            self.filtered_symbols().get(self.symbol_index).map(|s| s.to_string()),
        ) else {
            return Err(ValidationError::EmptySelection.into());
        };
        let Some(market) = self.markets.get(&symbol).cloned() else {
            return Err(ValidationError::EmptySelection.into());
        };

        let account = &self.accounts[index];
        let ticker = account.broker().fetch_ticker(&symbol)?;
        let side = self.cursor.as_ref().map_or(Side::Buy, TradingCursor::side);
        let mut cursor = TradingCursor::new(&market, ticker.last);
        cursor.set_side(side);

        info!(
            "Selected {symbol} on {account}: last {} min amount {}",
            ticker.last,
            cursor.min_amount()
        );
        audit::log_symbol_selected(&mut self.audit, account, &symbol);

        self.refresh.clear();
        self.market = Some(market);
        self.cursor = Some(cursor);
        self.enter(Screen::MainTrading)
    }

    /// Switch to a data screen and refresh. A failed refresh keeps the old
    /// snapshot and the new screen.
    fn enter(&mut self, screen: Screen) -> Result<()> {
        info!("{} -> {}", self.screen.title(), screen.title());
        self.screen = screen;
        if screen == Screen::OpenOrders {
            self.order_index = 0;
        }
        if screen.refreshes_on_entry() {
            self.refresh_snapshot()?;
        }
        Ok(())
    }

    fn refresh_snapshot(&mut self) -> Result<()> {
        let (Some(index), Some(market)) = (self.active, self.market.as_ref()) else {
            return Ok(());
        };
        let snapshot = self.refresh.refresh(&self.accounts[index], &market.symbol)?;
        if let (Some(cursor), Some(last)) = (self.cursor.as_mut(), snapshot.last_price()) {
            let minimum = precision::observe_last_price(cursor, market, last);
            debug!("last {last}, minimum amount {minimum}");
        }
        let visible = snapshot.open_orders.len().min(OPEN_ORDER_ROWS);
        self.order_index = self.order_index.min(visible.saturating_sub(1));
        Ok(())
    }

    fn submit(&mut self) {
        let (Some(index), Some(market), Some(cursor)) =
            (self.active, self.market.as_ref(), self.cursor.as_ref())
        else {
            return;
        };
        let ticket = OrderTicket::from_cursor(&market.symbol, cursor);
        match self
            .orders
            .submit(&self.accounts[index], &ticket, &mut self.audit)
        {
            Ok(record) => {
                let message = format!(
                    "Order {} {}: {} {} {} @ {} (cost {})",
                    record.order_id,
                    record.status,
                    record.side,
                    record.amount,
                    record.symbol,
                    record.price,
                    record.cost
                );
                match self.refresh_snapshot() {
                    Ok(()) => self.banner = Some(Banner::Info(message)),
                    Err(e) => self.report_error(&format!("{message}; refresh failed: {e}")),
                }
            }
            Err(e) => self.banner = Some(Banner::Error(e.to_string())),
        }
    }

    fn answer_cancel(&mut self, order: OpenOrder, confirmation: Confirmation) {
        let Some(index) = self.active else {
            return;
        };
        let id: OrderId = order.id;
        match self.orders.cancel(
            &self.accounts[index],
            &order.symbol,
            &id,
            confirmation,
            &mut self.audit,
        ) {
            Ok(false) => self.banner = Some(Banner::Info(format!("Cancel of {id} aborted"))),
            Ok(true) => match self.refresh_snapshot() {
                Ok(()) => self.banner = Some(Banner::Info(format!("Order {id} cancelled"))),
                Err(e) => {
                    self.report_error(&format!("Order {id} cancelled; refresh failed: {e}"))
                }
            },
            Err(e) => self.banner = Some(Banner::Error(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::OrderJournal;
    use quicktrade_broker::Broker;
    use quicktrade_broker::mock::{Call, MockBroker};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use rust_decimal_macros::dec;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(broker: &MockBroker, dir: &tempfile::TempDir) -> App {
        let account = AccountHandle::new("paper", "demo", Box::new(broker.clone()));
        App::new(
            vec![account],
            OrderManager::new(OrderJournal::new(dir.path())),
            AuditLog::open(&dir.path().join("audit.jsonl")).unwrap(),
        )
    }

    fn paper() -> MockBroker {
        let mut broker = MockBroker::paper();
        broker.connect().unwrap();
        broker
    }

    #[test]
    fn account_then_filtered_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        let mut app = app(&broker, &dir);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen(), Screen::SymbolSelect);
        assert_eq!(app.filtered_symbols().len(), 4);

        for c in "eth".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.filtered_symbols(), ["ETH/BTC", "ETH/USDT"]);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.symbol_index(), 1);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen(), Screen::MainTrading);
        assert_eq!(app.market().unwrap().symbol, "ETH/USDT");
        assert_eq!(app.cursor().unwrap().price(), dec!(3200.00));
        assert_eq!(broker.calls(Call::FetchOpenOrders), 1);
    }

    #[test]
    fn market_load_failure_stays_put() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        broker.fail_next(
            Call::LoadMarkets,
            quicktrade_broker::GatewayError::Network("timed out".into()),
        );
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen(), Screen::AccountSelect);
        assert!(matches!(app.banner(), Some(Banner::Error(m)) if m.contains("timed out")));

        // the banner goes away on the next key
        app.handle_key(key(KeyCode::Down));
        assert!(app.banner().is_none());
    }

    #[test]
    fn price_keys_move_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter)); // BTC/USDT
        let start = app.cursor().unwrap().price();

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.cursor().unwrap().price(), start + dec!(0.01));
        app.handle_key(key(KeyCode::Char('w')));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.cursor().unwrap().price(), start + dec!(0.11));

        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.cursor().unwrap().side(), Side::Sell);
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.cursor().unwrap().price(), start);
        assert_eq!(app.cursor().unwrap().side(), Side::Sell);
    }

    #[test]
    fn declined_cancel_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        broker
            .create_limit_order("BTC/USDT", Side::Buy, dec!(0.001), dec!(60000))
            .unwrap();
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.screen(), Screen::OpenOrders);

        app.handle_key(key(KeyCode::Enter));
        assert!(app.pending_cancel().is_some());
        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.pending_cancel().is_none());
        assert_eq!(broker.calls(Call::CancelOrder), 0);
        assert_eq!(app.snapshot().open_orders.len(), 1);
        assert_eq!(app.screen(), Screen::OpenOrders);
    }

    #[test]
    fn empty_open_orders_select_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('o')));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.pending_cancel().is_none());
        assert!(matches!(app.banner(), Some(Banner::Error(_))));
    }

    #[test]
    fn amount_never_below_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        let minimum = app.cursor().unwrap().min_amount();
        app.handle_key(key(KeyCode::Char('z')));
        assert_eq!(app.cursor().unwrap().amount(), minimum);
        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.cursor().unwrap().amount() > minimum);
    }

    #[test]
    fn back_and_quit() {
        let dir = tempfile::tempdir().unwrap();
        let broker = paper();
        let mut app = app(&broker, &dir);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(app.screen(), Screen::Balances);
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.screen(), Screen::MainTrading);
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.screen(), Screen::AccountSelect);
        assert!(app.active_account().is_none());
        assert!(app.is_running());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.is_running());
    }
}
