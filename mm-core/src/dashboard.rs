//! Terminal dashboard: current quotes, mid/mark/drift, quoting state,
//! position, collateral, and unwind/error counters. Grounded on the
//! `ratatui` + `crossterm` terminal setup/teardown and layout style of the
//! teacher's `bog-debug::orderbook_tui` binary, collapsed to a single
//! status render (no keyboard interaction — this dashboard is read-only
//! observability for the control loop, not an interactive tool).
//!
//! Render failures must never propagate into the control path; every public
//! method here swallows its own I/O errors and logs instead.

use crate::model::{Collateral, OrderBookSnapshot, Position};
use crate::order_manager::OrderManagerStats;
use crate::quoting::QuoteState;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use rust_decimal::Decimal;
use std::io;
use tracing::warn;

pub struct DashboardView<'a> {
    pub coin: &'a str,
    pub mark_price: Decimal,
    pub mid: Decimal,
    pub drift_bps: Decimal,
    pub book: &'a OrderBookSnapshot,
    pub state: QuoteState,
    pub position: Option<&'a Position>,
    pub collateral: &'a Collateral,
    pub stats: &'a OrderManagerStats,
    pub consecutive_errors: u32,
}

pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Dashboard {
    pub fn start() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn render(&mut self, view: &DashboardView<'_>) {
        if let Err(err) = self.try_render(view) {
            warn!(%err, "dashboard render failed, continuing without it");
        }
    }

    fn try_render(&mut self, view: &DashboardView<'_>) -> anyhow::Result<()> {
        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(5),
                    Constraint::Min(3),
                ])
                .split(frame.size());

            let header = Paragraph::new(Line::from(vec![
                Span::styled(format!(" {} ", view.coin), Style::default().fg(Color::Cyan)),
                Span::raw(format!("state={:?}", view.state)),
            ]))
            .block(Block::default().borders(Borders::ALL).title("market maker"));
            frame.render_widget(header, chunks[0]);

            let market = Paragraph::new(vec![
                Line::from(format!("mark {}  mid {}  drift {}bps", view.mark_price, view.mid, view.drift_bps)),
                Line::from(format!(
                    "bid {} @ {}  ask {} @ {}",
                    view.book.best_bid_size, view.book.best_bid_price, view.book.best_ask_size, view.book.best_ask_price
                )),
            ])
            .block(Block::default().borders(Borders::ALL).title("book"));
            frame.render_widget(market, chunks[1]);

            let position_line = match view.position {
                Some(p) if !p.is_flat() => {
                    format!("{:?} {} @ {} (uPnL {})", p.side, p.size, p.entry_price, p.unrealized_pnl)
                }
                _ => "flat".to_string(),
            };
            let footer = Paragraph::new(vec![
                Line::from(format!("position: {position_line}")),
                Line::from(format!(
                    "collateral: total {} available {}",
                    view.collateral.total, view.collateral.available
                )),
                Line::from(format!(
                    "placed={} cancelled={} rebalanced={} errors={}",
                    view.stats.placed, view.stats.cancelled, view.stats.rebalanced, view.consecutive_errors
                )),
            ])
            .block(Block::default().borders(Borders::ALL).title("position"));
            frame.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}
