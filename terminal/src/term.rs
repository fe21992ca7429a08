//! Terminal lifecycle and the blocking event loop.

use std::collections::VecDeque;
use std::io::{self, stdout};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use log::error;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

use crate::app::App;
use crate::error::{Error, Result};
use crate::ui;

/// Raw mode plus alternate screen for as long as the guard lives.
///
/// Dropping the guard, or panicking while it is alive, puts the terminal
/// back into cooked mode. The panic hook is installed once per process and
/// only restores while a guard is armed.
pub struct TerminalGuard;

static PANIC_HOOK: Once = Once::new();
static ARMED: AtomicBool = AtomicBool::new(false);

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().map_err(|e| Error::Terminal(format!("raw mode: {e}")))?;
        if let Err(e) = execute!(stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(Error::Terminal(format!("alternate screen: {e}")));
        }

        arm();
        PANIC_HOOK.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                if disarm() {
                    restore();
                }
                previous(info);
            }));
        });
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if disarm() {
            restore();
        }
    }
}

fn arm() {
    ARMED.store(true, Ordering::SeqCst);
}

/// True only for the first caller after `arm`.
fn disarm() -> bool {
    ARMED.swap(false, Ordering::SeqCst)
}

fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen);
}

/// Where key presses come from.
pub trait InputSource {
    /// Block for the next key press. `None` when input is exhausted.
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>>;
}

/// Keyboard input from the real terminal. Releases and repeats are skipped.
pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(key));
                }
            }
        }
    }
}

/// A fixed key sequence.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    keys: VecDeque<KeyEvent>,
}

impl ScriptedInput {
    pub fn new(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        Ok(self.keys.pop_front())
    }
}

/// Render, read one key, act; until quit or end of input.
///
/// A failed draw is reported on the banner and retried after the next key.
pub fn run_loop<B, I>(terminal: &mut Terminal<B>, app: &mut App, input: &mut I) -> Result<()>
where
    B: Backend,
    I: InputSource,
{
    while app.is_running() {
        if let Err(e) = terminal.draw(|f| ui::draw(f, app)) {
            error!("draw failed: {e}");
            app.report_error(&format!("render failed: {e}"));
        }
        match input.next_key()? {
            Some(key) => app.handle_key(key),
            None => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_is_restored_once_per_guard() {
        arm();
        assert!(disarm());
        assert!(!disarm());

        // a second session arms again
        arm();
        assert!(disarm());
        assert!(!disarm());
    }

    #[test]
    fn scripted_input_runs_dry() {
        let mut input = ScriptedInput::new([KeyEvent::from(ratatui::crossterm::event::KeyCode::Enter)]);
        assert!(input.next_key().unwrap().is_some());
        assert!(input.next_key().unwrap().is_none());
    }
}
