//! Screens and the `(Screen, key) -> Action` dispatch table.

use quicktrade::{Direction, Rescale};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The active view. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    AccountSelect,
    SymbolSelect,
    MainTrading,
    OpenOrders,
    Balances,
    TradeHistory,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::AccountSelect => "Select account",
            Screen::SymbolSelect => "Select symbol",
            Screen::MainTrading => "Trade",
            Screen::OpenOrders => "Open orders",
            Screen::Balances => "Balances",
            Screen::TradeHistory => "Trade history (24h)",
        }
    }

    /// Screens whose entry action is a snapshot refresh.
    pub fn refreshes_on_entry(self) -> bool {
        matches!(
            self,
            Screen::MainTrading | Screen::OpenOrders | Screen::Balances | Screen::TradeHistory
        )
    }

    /// Where `q` leads. `None` on the first screen, where it quits.
    pub fn parent(self) -> Option<Screen> {
        match self {
            Screen::AccountSelect => None,
            Screen::SymbolSelect | Screen::MainTrading => Some(Screen::AccountSelect),
            Screen::OpenOrders | Screen::Balances | Screen::TradeHistory => {
                Some(Screen::MainTrading)
            }
        }
    }
}

/// What a key press asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    MoveUp,
    MoveDown,
    Select,
    FilterPush(char),
    FilterPop,
    FilterClear,
    StepPrice(Direction),
    StepAmount(Direction),
    Rescale(Rescale),
    Submit,
    Reset,
    ToggleSide,
    Goto(Screen),
    None,
}

/// Look up the action bound to `key` on `screen`.
pub fn action_for(screen: Screen, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }

    match (screen, key.code) {
        (Screen::AccountSelect, KeyCode::Char('q')) => Action::Quit,
        (_, KeyCode::Char('q')) => Action::Back,

        (Screen::AccountSelect | Screen::SymbolSelect | Screen::OpenOrders, KeyCode::Up) => {
            Action::MoveUp
        }
        (Screen::AccountSelect | Screen::SymbolSelect | Screen::OpenOrders, KeyCode::Down) => {
            Action::MoveDown
        }
        (Screen::AccountSelect | Screen::SymbolSelect | Screen::OpenOrders, KeyCode::Enter) => {
            Action::Select
        }

        (Screen::SymbolSelect, KeyCode::Backspace) => Action::FilterPop,
        (Screen::SymbolSelect, KeyCode::Esc) => Action::FilterClear,
        (Screen::SymbolSelect, KeyCode::Char(c)) if !c.is_control() => Action::FilterPush(c),

        (Screen::MainTrading, code) => main_trading(code),

        _ => Action::None,
    }
}

fn main_trading(code: KeyCode) -> Action {
    match code {
        KeyCode::Up => Action::StepPrice(Direction::Up),
        KeyCode::Down => Action::StepPrice(Direction::Down),
        KeyCode::Char('a') => Action::StepAmount(Direction::Up),
        KeyCode::Char('z') => Action::StepAmount(Direction::Down),
        KeyCode::Char('w') => Action::Rescale(Rescale::Coarser),
        KeyCode::Char('e') => Action::Rescale(Rescale::Finer),
        KeyCode::Char(' ') => Action::Submit,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('t') => Action::ToggleSide,
        KeyCode::Char('o') => Action::Goto(Screen::OpenOrders),
        KeyCode::Char('b') => Action::Goto(Screen::Balances),
        KeyCode::Char('h') => Action::Goto(Screen::TradeHistory),
        KeyCode::Char('s') => Action::Goto(Screen::SymbolSelect),
        _ => Action::None,
    }
}

/// The character typed by `key`, if any.
pub fn key_char(key: KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(c),
        _ => None,
    }
}
