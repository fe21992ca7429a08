//! Rendering: one `draw` per frame, dispatched on the current screen.

use chrono::{DateTime, Local};
use quicktrade::Side;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use rust_decimal::Decimal;

use crate::app::{App, Banner, OPEN_ORDER_ROWS};
use crate::nav::Screen;

/// Trades shown on the history screen.
pub const TRADE_ROWS: usize = 30;

/// Decimal places on the balances screen.
pub const BALANCE_DECIMALS: usize = 8;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // body
            Constraint::Length(1), // banner / prompt
            Constraint::Length(1), // key help
        ])
        .split(f.area());

    let block = Block::default()
        .title(title(app))
        .borders(Borders::ALL);
    let body = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    match app.screen() {
        Screen::AccountSelect => draw_accounts(f, app, body),
        Screen::SymbolSelect => draw_symbols(f, app, body),
        Screen::MainTrading => draw_trading(f, app, body),
        Screen::OpenOrders => draw_open_orders(f, app, body),
        Screen::Balances => draw_balances(f, app, body),
        Screen::TradeHistory => draw_trades(f, app, body),
    }

    f.render_widget(Paragraph::new(status_line(app)), chunks[1]);
    f.render_widget(
        Paragraph::new(help(app.screen())).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn title(app: &App) -> String {
    match (app.active_account(), app.market()) {
        (Some(account), Some(market)) if app.screen() != Screen::SymbolSelect => {
            format!(" {} | {account} | {} ", app.screen().title(), market.symbol)
        }
        (Some(account), _) => format!(" {} | {account} ", app.screen().title()),
        _ => format!(" {} ", app.screen().title()),
    }
}

fn status_line(app: &App) -> Line<'static> {
    if let Some(order) = app.pending_cancel() {
        return Line::from(Span::styled(
            format!(
                "Cancel {} {} {} @ {}? (y to confirm, any other key aborts)",
                order.id, order.side, order.amount, order.price
            ),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    match app.banner() {
        Some(Banner::Error(msg)) => {
            Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red)))
        }
        Some(Banner::Info(msg)) => {
            Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Green)))
        }
        None => Line::default(),
    }
}

fn help(screen: Screen) -> &'static str {
    match screen {
        Screen::AccountSelect => "up/down: move  enter: select  q: quit",
        Screen::SymbolSelect => {
            "type: filter  backspace: delete  esc: clear  up/down: move  enter: select  q: back"
        }
        Screen::MainTrading => {
            "up/down: price  a/z: amount  w/e: step x10/x0.1  space: submit  r: reset  t: side  \
             o: orders  b: balances  h: history  s: symbol  q: accounts"
        }
        Screen::OpenOrders => "up/down: move  enter: cancel order  q: back",
        Screen::Balances | Screen::TradeHistory => "q: back",
    }
}

fn selected() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

fn side_span(side: Side) -> Span<'static> {
    let color = match side {
        Side::Buy => Color::Green,
        Side::Sell => Color::Red,
    };
    Span::styled(
        side.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn format_time(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// First row to show so that `selected` stays inside a window of `height` rows.
pub fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 || selected < height {
        0
    } else {
        selected + 1 - height
    }
}

fn draw_accounts(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .accounts()
        .iter()
        .enumerate()
        .map(|(i, account)| {
            let line = Line::from(format!("  {account}"));
            if i == app.account_index() {
                line.style(selected())
            } else {
                line
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_symbols(f: &mut Frame, app: &App, area: Rect) {
    let symbols = app.filtered_symbols();
    let mut lines = vec![Line::from(format!("Filter: {}", app.filter())), Line::default()];

    let height = (area.height as usize).saturating_sub(lines.len());
    let offset = scroll_offset(app.symbol_index(), height);
    if symbols.is_empty() {
        lines.push(Line::from("  no matching symbols"));
    }
    for (i, symbol) in symbols.iter().enumerate().skip(offset).take(height) {
        let line = Line::from(format!("  {symbol}"));
        lines.push(if i == app.symbol_index() {
            line.style(selected())
        } else {
            line
        });
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_trading(f: &mut Frame, app: &App, area: Rect) {
    let (Some(market), Some(cursor)) = (app.market(), app.cursor()) else {
        f.render_widget(Paragraph::new("No market selected"), area);
        return;
    };
    let snapshot = app.snapshot();
    let quote_or_dash = |v: Option<Decimal>| v.map_or_else(|| "-".to_string(), |d| d.to_string());

    let account = app
        .active_account()
        .map(|a| a.to_string())
        .unwrap_or_default();
    let ticker = snapshot.ticker.as_ref();

    let lines = vec![
        Line::from(format!("Account: {account}    Symbol: {}", market.symbol)),
        Line::from(format!(
            "{} free: {}    {} free: {}",
            market.base,
            snapshot.balances.free(&market.base),
            market.quote,
            snapshot.balances.free(&market.quote)
        )),
        Line::from(format!(
            "Last: {}    Bid: {}    Ask: {}",
            quote_or_dash(ticker.map(|t| t.last)),
            quote_or_dash(ticker.and_then(|t| t.bid)),
            quote_or_dash(ticker.and_then(|t| t.ask)),
        )),
        Line::default(),
        Line::from(vec![Span::raw("Side:     "), side_span(cursor.side())]),
        Line::from(format!(
            "Price:    {}    (step {})",
            cursor.price(),
            cursor.effective_price_step(market)
        )),
        Line::from(format!(
            "Amount:   {}    (step {}, min {})",
            cursor.amount(),
            market.amount_step,
            cursor.min_amount()
        )),
        Line::from(format!("Notional: {} {}", cursor.notional(), market.quote)),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_open_orders(f: &mut Frame, app: &App, area: Rect) {
    let orders = &app.snapshot().open_orders;
    if orders.is_empty() {
        f.render_widget(Paragraph::new("No open orders"), area);
        return;
    }
    let rows = orders.iter().take(OPEN_ORDER_ROWS).enumerate().map(|(i, o)| {
        let row = Row::new(vec![
            Cell::from(o.id.to_string()),
            Cell::from(o.symbol.clone()),
            Cell::from(o.order_type.clone()),
            Cell::from(side_span(o.side)),
            Cell::from(o.price.to_string()),
            Cell::from(o.amount.to_string()),
            Cell::from(format_time(o.timestamp_ms)),
        ]);
        if i == app.order_index() {
            row.style(selected())
        } else {
            row
        }
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(20), // id
            Constraint::Length(12), // symbol
            Constraint::Length(8),  // type
            Constraint::Length(5),  // side
            Constraint::Length(16), // price
            Constraint::Length(16), // amount
            Constraint::Min(19),    // time
        ],
    )
    .header(
        Row::new(["ID", "Symbol", "Type", "Side", "Price", "Amount", "Time"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    );
    f.render_widget(table, area);
}

fn draw_balances(f: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .snapshot()
        .balances
        .non_zero()
        .map(|b| {
            Row::new(vec![
                b.asset.clone(),
                format!("{:.*}", BALANCE_DECIMALS, b.free),
                format!("{:.*}", BALANCE_DECIMALS, b.used),
                format!("{:.*}", BALANCE_DECIMALS, b.total),
            ])
        })
        .collect();
    if rows.is_empty() {
        f.render_widget(Paragraph::new("No balances"), area);
        return;
    }
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(22),
            Constraint::Length(22),
            Constraint::Length(22),
        ],
    )
    .header(
        Row::new(["Asset", "Free", "Used", "Total"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    );
    f.render_widget(table, area);
}

fn draw_trades(f: &mut Frame, app: &App, area: Rect) {
    let trades = &app.snapshot().trades;
    if trades.is_empty() {
        f.render_widget(Paragraph::new("No trades in the last 24h"), area);
        return;
    }
    let rows = trades.iter().take(TRADE_ROWS).map(|t| {
        Row::new(vec![
            Cell::from(t.id.clone()),
            Cell::from(t.order_id.to_string()),
            Cell::from(side_span(t.side)),
            Cell::from(t.price.to_string()),
            Cell::from(t.amount.to_string()),
            Cell::from(format_time(t.timestamp_ms)),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(20),
            Constraint::Length(5),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Min(19),
        ],
    )
    .header(
        Row::new(["Trade", "Order", "Side", "Price", "Amount", "Time"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    );
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_keeps_selection_visible() {
        assert_eq!(scroll_offset(0, 5), 0);
        assert_eq!(scroll_offset(4, 5), 0);
        assert_eq!(scroll_offset(5, 5), 1);
        assert_eq!(scroll_offset(12, 5), 8);
        assert_eq!(scroll_offset(3, 0), 0);
    }

    #[test]
    fn balances_use_eight_places() {
        let d = Decimal::new(15, 1);
        assert_eq!(format!("{:.*}", BALANCE_DECIMALS, d), "1.50000000");
    }
}
