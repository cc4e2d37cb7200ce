//! The orchestrator (component C5): the single control loop that drives
//! C1–C4 each tick. Scheduling model is single-threaded cooperative: one
//! logical task owns the order manager and all counters, and every I/O call
//! is a suspension point (`await`), matching §5's concurrency model.

use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardView};
use crate::exchange::ExchangeAdapter;
use crate::model::{Collateral, MarketTick, Position, Side};
use crate::order_manager::{OrderManager, OrderManagerStats};
use crate::position_log::PositionLog;
use crate::quoting::{can_modify, classify, derive, QuoteState, QuotingInputs};
use crate::snapshot::{SnapshotView, SnapshotWriter};
use crate::testing::Clock;
use crate::unwind::unwind;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// What happened on one tick, for tests that want to assert behaviour
/// without running the full sleep-driven loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    SkippedGap,
    Unwound,
    Rebalanced,
    Placed,
    CancelledWaiting,
    NoAction,
}

pub struct Orchestrator {
    adapter: Arc<dyn ExchangeAdapter>,
    symbol: String,
    config: Config,
    clock: Arc<dyn Clock>,
    order_manager: OrderManager,
    stats: OrderManagerStats,
    position_log: PositionLog,
    snapshot_writer: SnapshotWriter,
    dashboard: Option<Dashboard>,

    orders_exist_since: Option<u64>,
    last_mid_unstable_at: Option<u64>,
    collateral_dirty: bool,
    consecutive_errors: u32,
    last_snapshot_at: u64,
    collateral: Collateral,
}

impl Orchestrator {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        symbol: impl Into<String>,
        config: Config,
        order_manager: OrderManager,
        clock: Arc<dyn Clock>,
        dashboard: Option<Dashboard>,
    ) -> Self {
        let position_log = PositionLog::new(&config.position_log_file);
        let snapshot_writer = SnapshotWriter::new(&config.snapshot_file);
        Self {
            adapter,
            symbol: symbol.into(),
            config,
            clock,
            order_manager,
            stats: OrderManagerStats::default(),
            position_log,
            snapshot_writer,
            dashboard,
            orders_exist_since: None,
            last_mid_unstable_at: None,
            collateral_dirty: true,
            consecutive_errors: 0,
            last_snapshot_at: 0,
            collateral: Collateral {
                total: Decimal::ZERO,
                available: Decimal::ZERO,
            },
        }
    }

    /// Runs the control loop forever (or until `max_consecutive_errors`
    /// exits it). See §4.5 for the per-iteration ordering this mirrors.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.tick().await {
                Ok(_) => {
                    self.consecutive_errors = 0;
                    sleep(Duration::from_secs_f64(self.config.refresh_interval)).await;
                }
                Err(err) => {
                    self.consecutive_errors += 1;
                    error!(%err, consecutive_errors = self.consecutive_errors, "tick failed");
                    if self.consecutive_errors >= self.config.max_consecutive_errors {
                        error!("max_consecutive_errors reached, exiting");
                        return Err(err);
                    }
                    let backoff = (self.consecutive_errors as f64 * 0.5).min(10.0);
                    sleep(Duration::from_secs_f64(backoff)).await;
                }
            }
        }
    }

    /// One iteration of the control loop (§4.5, steps 2–8; step 1's restart
    /// check and step 9/10's error handling live in [`Self::run`]).
    pub async fn tick(&mut self) -> anyhow::Result<TickOutcome> {
        if self.collateral_dirty {
            self.collateral = self.adapter.get_collateral().await?;
            self.collateral_dirty = false;
        }

        if matches!(self.order_manager, OrderManager::Live(_)) {
            self.order_manager.fetch_open().await?;
        }

        let mark = self.adapter.get_mark_price(&self.symbol).await?;
        let book = self.adapter.get_orderbook(&self.symbol).await?;
        if mark <= Decimal::ZERO || !book.is_valid() {
            debug!("market data gap, skipping tick");
            return Ok(TickOutcome::SkippedGap);
        }

        let position = self.adapter.get_position(&self.symbol).await?;

        if self.config.auto_close_position {
            if let Some(position) = position.filter(|p| !p.is_flat()) {
                return self.unwind_position(position).await;
            }
        }

        let tick = MarketTick {
            mark_price: mark,
            book,
            position: position.unwrap_or_else(Position::flat),
            collateral: self.collateral,
        };

        self.run_quoting(&tick).await?;

        let now = self.clock.now_millis();
        if now.saturating_sub(self.last_snapshot_at) >= self.config.snapshot_interval * 1000 {
            self.write_snapshot(&tick);
            self.last_snapshot_at = now;
        }

        Ok(TickOutcome::NoAction)
    }

    async fn unwind_position(&mut self, position: Position) -> anyhow::Result<TickOutcome> {
        self.order_manager.cancel_all("position").await;
        self.orders_exist_since = None;
        self.position_log.append(&format!(
            "position detected: {:?} {} @ {}",
            position.side, position.size, position.entry_price
        ));

        let unwind_config = self.config.unwind_config()?;
        let outcome = unwind(self.adapter.as_ref(), &self.symbol, position, unwind_config).await?;
        self.position_log.append(&format!(
            "unwind outcome: success={} iterations={} elapsed={:.2}s — {}",
            outcome.success, outcome.iterations_used, outcome.elapsed_seconds, outcome.summary
        ));
        if !outcome.success {
            warn!(summary = %outcome.summary, "unwind did not succeed");
        }
        self.collateral_dirty = true;
        Ok(TickOutcome::Unwound)
    }

    async fn run_quoting(&mut self, tick: &MarketTick) -> anyhow::Result<()> {
        let has_orders = self.order_manager.has_orders();
        let reference_price = self
            .order_manager
            .get_order(Side::Buy)
            .or_else(|| self.order_manager.get_order(Side::Sell))
            .map(|o| o.reference_price)
            .unwrap_or(tick.mark_price);

        let inputs = QuotingInputs {
            mark: tick.mark_price,
            book: tick.book,
            has_orders,
            reference_price,
            available_collateral: tick.collateral.available,
            total_collateral: tick.collateral.total,
        };
        let thresholds = self.config.quoting_thresholds()?;
        let derived = derive(&inputs, &thresholds);
        let now = self.clock.now_millis();
        let state = classify(&derived, &inputs, &thresholds, now, self.last_mid_unstable_at);

        if thresholds.mark_mid_diff_limit_bps > Decimal::ZERO
            && derived.mid_diff_bps > thresholds.mark_mid_diff_limit_bps
        {
            self.last_mid_unstable_at = Some(now);
        }

        let modifiable = can_modify(now, self.orders_exist_since, thresholds.min_wait_sec);

        match state {
            QuoteState::Rebalancing if modifiable => {
                self.stats.rebalance_noted();
                let count = self.order_manager.cancel_all("drift").await;
                self.stats.note_cancelled(count);
                self.orders_exist_since = None;
                sleep(Duration::from_secs_f64(self.config.cancel_after_delay)).await;
            }
            QuoteState::Waiting if has_orders => {
                let count = self.order_manager.cancel_all("taker risk").await;
                self.stats.note_cancelled(count);
                self.orders_exist_since = None;
            }
            QuoteState::Placing => {
                let (buy, sell) = self
                    .order_manager
                    .place_pair(derived.buy_price, derived.sell_price, derived.size, tick.mark_price)
                    .await;
                if buy.is_ok() {
                    self.stats.note_placed();
                }
                if sell.is_ok() {
                    self.stats.note_placed();
                }
                self.orders_exist_since = Some(now);
            }
            _ => {}
        }

        self.render_dashboard(tick, state, &derived);
        Ok(())
    }

    fn render_dashboard(&mut self, tick: &MarketTick, state: QuoteState, derived: &crate::quoting::Derived) {
        if let Some(dashboard) = &mut self.dashboard {
            let view = DashboardView {
                coin: &self.config.coin,
                mark_price: tick.mark_price,
                mid: derived.mid,
                drift_bps: derived.drift_bps,
                book: &tick.book,
                state,
                position: Some(&tick.position),
                collateral: &tick.collateral,
                stats: &self.stats,
                consecutive_errors: self.consecutive_errors,
            };
            dashboard.render(&view);
        }
    }

    fn write_snapshot(&self, tick: &MarketTick) {
        let thresholds = match self.config.quoting_thresholds() {
            Ok(t) => t,
            Err(_) => return,
        };
        let inputs = QuotingInputs {
            mark: tick.mark_price,
            book: tick.book,
            has_orders: self.order_manager.has_orders(),
            reference_price: tick.mark_price,
            available_collateral: tick.collateral.available,
            total_collateral: tick.collateral.total,
        };
        let derived = derive(&inputs, &thresholds);
        let now = self.clock.now_millis();
        let state = classify(&derived, &inputs, &thresholds, now, self.last_mid_unstable_at);
        let view = SnapshotView {
            mark_price: tick.mark_price,
            book: &tick.book,
            position: Some(&tick.position),
            collateral: &tick.collateral,
            state,
            stats: &self.stats,
        };
        self.snapshot_writer.write(&view);
    }

    /// Final shutdown: cancels every order the exchange knows about for
    /// this symbol (a blanket cancel, not the per-tick cached-orders-only
    /// cancel), per §6.
    pub async fn shutdown(&mut self) {
        self.order_manager.cancel_all_on_shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{ManualClock, ScriptedAdapter, ScriptedTick};
    use rust_decimal_macros::dec;

    fn orchestrator(adapter: Arc<ScriptedAdapter>, config: Config) -> Orchestrator {
        Orchestrator::new(
            adapter,
            "BTC",
            config,
            OrderManager::simulated(),
            Arc::new(ManualClock::new(0)),
            None,
        )
    }

    #[tokio::test]
    async fn places_pair_when_flat_and_no_orders() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let mut config = Config::default();
        config.snapshot_file = "/tmp/mm_orchestrator_test_status.txt".to_string();
        config.position_log_file = "/tmp/mm_orchestrator_test_position.log".to_string();
        let mut orch = orchestrator(adapter.clone(), config);
        let outcome = orch.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::NoAction);
        assert!(orch.order_manager.has_orders());
    }

    #[tokio::test]
    async fn skips_tick_on_zero_mark_price() {
        let adapter = Arc::new(ScriptedAdapter::with_ticks(vec![ScriptedTick {
            mark_price: dec!(0),
            ..ScriptedTick::default()
        }]));
        let mut config = Config::default();
        config.snapshot_file = "/tmp/mm_orchestrator_test_status2.txt".to_string();
        config.position_log_file = "/tmp/mm_orchestrator_test_position2.log".to_string();
        let mut orch = orchestrator(adapter, config);
        let outcome = orch.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::SkippedGap);
    }

    #[tokio::test]
    async fn unwinds_when_position_nonzero_and_auto_close_enabled() {
        use crate::model::PositionSide;
        let adapter = Arc::new(ScriptedAdapter::with_ticks(vec![ScriptedTick {
            position: Some(Position {
                side: PositionSide::Long,
                size: dec!(0.0015),
                entry_price: dec!(99000),
                unrealized_pnl: dec!(10),
            }),
            ..ScriptedTick::default()
        }]));
        let mut config = Config::default();
        config.auto_close_position = true;
        config.snapshot_file = "/tmp/mm_orchestrator_test_status3.txt".to_string();
        config.position_log_file = "/tmp/mm_orchestrator_test_position3.log".to_string();
        let mut orch = orchestrator(adapter.clone(), config);
        let outcome = orch.tick().await.unwrap();
        assert_eq!(outcome, TickOutcome::Unwound);
        assert!(!adapter.created_orders().is_empty());
    }
}
