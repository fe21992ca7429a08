//! End-to-end session tests: scripted keys against the mock exchange,
//! rendered into a test backend.

use quicktrade::MarketDescriptor;
use quicktrade_broker::mock::{Call, FillMode, MockBroker};
use quicktrade_broker::{Broker, GatewayError};
use quicktrade_terminal::account::AccountHandle;
use quicktrade_terminal::app::{App, Banner};
use quicktrade_terminal::audit::AuditLog;
use quicktrade_terminal::journal::OrderJournal;
use quicktrade_terminal::nav::Screen;
use quicktrade_terminal::orders::OrderManager;
use quicktrade_terminal::term::{ScriptedInput, run_loop};
use quicktrade_terminal::ui;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rust_decimal_macros::dec;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ch(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn enter() -> KeyEvent {
    key(KeyCode::Enter)
}

struct Session {
    dir: tempfile::TempDir,
    broker: MockBroker,
    app: App,
    terminal: Terminal<TestBackend>,
}

impl Session {
    fn new(broker: MockBroker) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let account = AccountHandle::new("mock", "main", Box::new(broker.clone()));
        let app = App::new(
            vec![account],
            OrderManager::new(OrderJournal::new(dir.path())),
            AuditLog::open(&dir.path().join("audit.jsonl")).unwrap(),
        );
        Self {
            dir,
            broker,
            app,
            terminal: Terminal::new(TestBackend::new(140, 30)).unwrap(),
        }
    }

    fn run(&mut self, keys: impl IntoIterator<Item = KeyEvent>) {
        run_loop(&mut self.terminal, &mut self.app, &mut ScriptedInput::new(keys)).unwrap();
    }

    fn screen_text(&mut self) -> String {
        let app = &self.app;
        self.terminal.draw(|f| ui::draw(f, app)).unwrap();
        let buffer = self.terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn journal(&self) -> OrderJournal {
        OrderJournal::new(self.dir.path())
    }
}

fn btc_usdt() -> MarketDescriptor {
    MarketDescriptor::new("BTC", "USDT", dec!(0.01), dec!(0.001), dec!(10)).unwrap()
}

fn exchange() -> MockBroker {
    let mut broker = MockBroker::builder()
        .with_market(btc_usdt())
        .with_ticker("BTC/USDT", dec!(100), dec!(99.99), dec!(100.01))
        .with_balance("USDT", dec!(1000), dec!(0))
        .with_balance("BTC", dec!(0), dec!(0))
        .build();
    broker.connect().unwrap();
    broker
}

#[test]
fn main_screen_shows_minimum_and_side() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter()]);
    assert_eq!(s.app.screen(), Screen::MainTrading);
    assert_eq!(s.app.cursor().unwrap().min_amount(), dec!(0.101));

    let text = s.screen_text();
    assert!(text.contains("BUY"), "{text}");
    assert!(text.contains("min 0.101"), "{text}");
    assert!(text.contains("USDT free: 1000"), "{text}");
}

#[test]
fn cancelling_only_order_leaves_none() {
    let broker = exchange();
    broker
        .create_limit_order("BTC/USDT", quicktrade::Side::Buy, dec!(0.2), dec!(90))
        .unwrap();
    let mut s = Session::new(broker);

    s.run([enter(), enter(), ch('o')]);
    assert_eq!(s.app.snapshot().open_orders.len(), 1);

    s.run([enter(), ch('y')]);
    assert_eq!(s.broker.calls(Call::CancelOrder), 1);
    assert!(s.app.snapshot().open_orders.is_empty());
    assert!(matches!(s.app.banner(), Some(Banner::Info(m)) if m.contains("cancelled")));

    // leave and come back: a fresh refresh still reports nothing
    s.run([ch('q'), ch('o')]);
    assert_eq!(s.app.screen(), Screen::OpenOrders);
    assert!(s.app.snapshot().open_orders.is_empty());
    assert!(s.screen_text().contains("No open orders"));
}

#[test]
fn refresh_timeout_keeps_snapshot_and_shows_banner() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter(), ch('b')]);
    assert_eq!(s.app.screen(), Screen::Balances);
    let before = s.app.snapshot().clone();

    s.broker.set_last_price("BTC/USDT", dec!(250));
    s.broker
        .fail_next(Call::FetchBalance, GatewayError::Network("request timed out".into()));
    s.run([ch('q')]);

    assert_eq!(s.app.screen(), Screen::MainTrading);
    assert_eq!(s.app.snapshot().last_price(), before.last_price());
    assert_eq!(s.app.snapshot().balances, before.balances);
    assert!(matches!(s.app.banner(), Some(Banner::Error(m)) if m.contains("timed out")));
    assert!(s.screen_text().contains("request timed out"));

    // any key clears it
    s.run([ch('x')]);
    assert!(s.app.banner().is_none());
}

#[test]
fn reset_uses_fresh_last_price() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter(), key(KeyCode::Up), ch('a')]);
    assert_eq!(s.app.cursor().unwrap().price(), dec!(100.01));

    s.broker.set_last_price("BTC/USDT", dec!(250));
    s.run([ch('r')]);
    let cursor = s.app.cursor().unwrap();
    assert_eq!(cursor.price(), dec!(250));
    // ceil(10 / 250 / 0.001) = 40, plus one step
    assert_eq!(cursor.min_amount(), dec!(0.041));
    assert_eq!(cursor.amount(), dec!(0.041));
    assert_eq!(s.app.snapshot().last_price(), Some(dec!(250)));
}

#[test]
fn reset_refresh_failure_keeps_cursor_and_shows_banner() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter(), key(KeyCode::Up)]);

    s.broker.set_last_price("BTC/USDT", dec!(250));
    s.broker
        .fail_next(Call::FetchTicker, GatewayError::Network("request timed out".into()));
    s.run([ch('r')]);

    assert_eq!(s.app.cursor().unwrap().price(), dec!(100.01));
    assert_eq!(s.app.snapshot().last_price(), Some(dec!(100)));
    assert!(matches!(s.app.banner(), Some(Banner::Error(m)) if m.contains("timed out")));
}

#[test]
fn submit_writes_one_journal_row() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter(), ch(' ')]);

    assert_eq!(s.broker.calls(Call::CreateLimitOrder), 1);
    let rows = s.journal().read("mock", "main").unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.symbol, "BTC/USDT");
    assert_eq!(row.price, dec!(100));
    assert_eq!(row.amount, dec!(0.101));
    assert_eq!(row.cost, row.price * row.amount);
    assert_eq!(row.status, "open");
    assert!(matches!(s.app.banner(), Some(Banner::Info(_))));

    // the new order shows up after the post-submit refresh
    assert_eq!(s.app.snapshot().open_orders.len(), 1);
}

#[test]
fn rejected_submit_writes_nothing() {
    let broker = exchange();
    broker.set_fill_mode(FillMode::Reject);
    let mut s = Session::new(broker);
    s.run([enter(), enter(), ch(' ')]);

    assert_eq!(s.broker.calls(Call::CreateLimitOrder), 1);
    assert!(s.journal().read("mock", "main").unwrap().is_empty());
    assert!(!s.journal().path_for("mock", "main").exists());
    assert!(matches!(s.app.banner(), Some(Banner::Error(_))));
    assert_eq!(s.app.screen(), Screen::MainTrading);
}

#[test]
fn sell_after_toggle_and_amount_step() {
    let mut s = Session::new(exchange());
    s.run([enter(), enter(), ch('t'), ch('a'), ch(' ')]);

    let rows = s.journal().read("mock", "main").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].side, quicktrade::Side::Sell);
    assert_eq!(rows[0].amount, dec!(0.111));
}

#[test]
fn symbol_list_scrolls_with_selection() {
    let mut builder = MockBroker::builder();
    for i in 0..40 {
        let base = format!("C{i:02}");
        builder = builder
            .with_market(MarketDescriptor::new(&base, "USDT", dec!(0.01), dec!(0.01), dec!(1)).unwrap());
    }
    let mut broker = builder.build();
    broker.connect().unwrap();
    let mut s = Session::new(broker);

    let mut keys = vec![enter()];
    keys.extend(std::iter::repeat_n(key(KeyCode::Down), 35));
    s.run(keys);
    assert_eq!(s.app.symbol_index(), 35);
    let text = s.screen_text();
    assert!(text.contains("C35/USDT"), "{text}");
    assert!(!text.contains("C00/USDT"));
}

#[test]
fn ctrl_c_quits_from_trading_screen() {
    let mut s = Session::new(exchange());
    s.run([
        enter(),
        enter(),
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ch(' '),
    ]);
    assert!(!s.app.is_running());
    assert_eq!(s.broker.calls(Call::CreateLimitOrder), 0);
}
