//! Status snapshot file: a full-file atomic rewrite of a human-readable
//! status block, on the interval configured by `snapshot_interval`. Writes
//! to a temp path in the same directory, then renames over the target so a
//! reader never observes a half-written file.

use crate::model::{Collateral, OrderBookSnapshot, Position};
use crate::order_manager::OrderManagerStats;
use crate::quoting::QuoteState;
use chrono::Local;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Everything the snapshot renders; gathered by the orchestrator once per
/// write rather than threading individual fields through.
pub struct SnapshotView<'a> {
    pub mark_price: Decimal,
    pub book: &'a OrderBookSnapshot,
    pub position: Option<&'a Position>,
    pub collateral: &'a Collateral,
    pub state: QuoteState,
    pub stats: &'a OrderManagerStats,
}

pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, view: &SnapshotView<'_>) {
        let body = render(view);
        if let Err(err) = self.write_atomic(&body) {
            warn!(path = %self.path.display(), %err, "failed to write snapshot");
        }
    }

    fn write_atomic(&self, body: &str) -> std::io::Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut f = std::fs::File::create(&tmp_path)?;
            f.write_all(body.as_bytes())?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)
    }
}

fn render(view: &SnapshotView<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("updated_at: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("state: {:?}\n", view.state));
    out.push_str(&format!("mark_price: {}\n", view.mark_price));
    out.push_str(&format!(
        "book: bid {} @ {} / ask {} @ {}\n",
        view.book.best_bid_size, view.book.best_bid_price, view.book.best_ask_size, view.book.best_ask_price
    ));
    match view.position {
        Some(p) if !p.is_flat() => {
            out.push_str(&format!(
                "position: {:?} {} @ {} (unrealized_pnl {})\n",
                p.side, p.size, p.entry_price, p.unrealized_pnl
            ));
        }
        _ => out.push_str("position: flat\n"),
    }
    out.push_str(&format!(
        "collateral: total {} available {}\n",
        view.collateral.total, view.collateral.available
    ));
    out.push_str(&format!(
        "stats: placed={} cancelled={} rebalanced={}\n",
        view.stats.placed, view.stats.cancelled, view.stats.rebalanced
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PositionSide;
    use rust_decimal_macros::dec;

    #[test]
    fn write_is_readable_and_overwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        let writer = SnapshotWriter::new(&path);

        let book = OrderBookSnapshot {
            best_bid_price: dec!(99999),
            best_bid_size: dec!(0.001),
            best_ask_price: dec!(100001),
            best_ask_size: dec!(0.001),
        };
        let collateral = Collateral {
            total: dec!(10000),
            available: dec!(9000),
        };
        let stats = OrderManagerStats::default();
        let view = SnapshotView {
            mark_price: dec!(100000),
            book: &book,
            position: None,
            collateral: &collateral,
            state: QuoteState::Monitoring,
            stats: &stats,
        };
        writer.write(&view);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("mark_price: 100000"));
        assert!(contents.contains("position: flat"));

        let position = Position {
            side: PositionSide::Long,
            size: dec!(0.002),
            entry_price: dec!(100000),
            unrealized_pnl: dec!(0),
        };
        let view2 = SnapshotView {
            position: Some(&position),
            ..view
        };
        writer.write(&view2);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("position: Long"));
    }
}
