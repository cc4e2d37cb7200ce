//! The quoting state machine (component C3).
//!
//! Unlike the teacher's lifecycle state machines (`core::strategy_fsm`,
//! `core::order_fsm`), which encode transitions at the type level with a
//! distinct struct per state, quoting status here is derived fresh every
//! tick from current market data and order-manager state: there is no
//! stored state to get out of sync with reality, only a classification
//! function run over the present tick.

use crate::model::OrderBookSnapshot;
use crate::pricing::{drift_bps, maker_classification, quantize_size, quote_prices, weighted_mid};
use rust_decimal::Decimal;

/// One of six mutually exclusive classifications computed each tick
/// (§4.3, "State classification (priority order)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    NoSize,
    Waiting,
    MidWait,
    Rebalancing,
    Monitoring,
    Placing,
}

/// Everything [`classify`] needs about the current tick and the order
/// manager's state, gathered by the orchestrator before calling C3.
#[derive(Debug, Clone, Copy)]
pub struct QuotingInputs {
    pub mark: Decimal,
    pub book: OrderBookSnapshot,
    pub has_orders: bool,
    pub reference_price: Decimal,
    pub available_collateral: Decimal,
    pub total_collateral: Decimal,
}

/// Static configuration thresholds the classification reads but never
/// mutates.
#[derive(Debug, Clone, Copy)]
pub struct QuotingThresholds {
    pub spread_bps: Decimal,
    pub drift_threshold_bps: Decimal,
    pub use_mid_drift: bool,
    pub mark_mid_diff_limit_bps: Decimal,
    pub mid_unstable_cooldown_sec: u64,
    pub min_wait_sec: u64,
    pub leverage: Decimal,
    pub size_unit: Decimal,
    pub max_size: Option<Decimal>,
}

/// The quantities derived once per tick that both the classifier and the
/// orchestrator's logging/dashboard code want; kept together so callers
/// don't recompute them.
#[derive(Debug, Clone, Copy)]
pub struct Derived {
    pub mid: Decimal,
    pub mid_diff_bps: Decimal,
    pub drift_bps: Decimal,
    pub effective_drift_bps: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub buy_maker: bool,
    pub sell_maker: bool,
    pub size: Decimal,
}

pub fn derive(inputs: &QuotingInputs, thresholds: &QuotingThresholds) -> Derived {
    let mid = weighted_mid(&inputs.book);
    let mid_diff_bps = if inputs.mark.is_zero() {
        Decimal::ZERO
    } else {
        ((mid - inputs.mark).abs() / inputs.mark) * Decimal::new(10_000, 0)
    };
    let drift = drift_bps(inputs.mark, inputs.reference_price);
    let effective_drift = if thresholds.use_mid_drift {
        drift + mid_diff_bps
    } else {
        drift
    };
    let (buy_price, sell_price) = quote_prices(inputs.mark, thresholds.spread_bps);
    let (buy_maker, sell_maker) = maker_classification(
        buy_price,
        sell_price,
        inputs.book.best_bid_price,
        inputs.book.best_ask_price,
    );
    let size = quantize_size(
        inputs.total_collateral,
        inputs.mark,
        thresholds.leverage,
        thresholds.size_unit,
        thresholds.max_size,
    );

    Derived {
        mid,
        mid_diff_bps,
        drift_bps: drift,
        effective_drift_bps: effective_drift,
        buy_price,
        sell_price,
        buy_maker,
        sell_maker,
        size,
    }
}

/// Classifies the current tick (§4.3's priority-ordered rule list). `now`,
/// `last_mid_unstable_at`, and `orders_exist_since` are unix-millis
/// timestamps so the caller can drive this with either a real or a manual
/// clock.
#[allow(clippy::too_many_arguments)]
pub fn classify(
    derived: &Derived,
    inputs: &QuotingInputs,
    thresholds: &QuotingThresholds,
    now_ms: u64,
    last_mid_unstable_at: Option<u64>,
) -> QuoteState {
    if derived.size.is_zero() {
        return QuoteState::NoSize;
    }
    if !derived.buy_maker || !derived.sell_maker {
        return QuoteState::Waiting;
    }

    let mid_unstable = thresholds.mark_mid_diff_limit_bps > Decimal::ZERO
        && derived.mid_diff_bps > thresholds.mark_mid_diff_limit_bps;
    let mid_cooldown = thresholds.mid_unstable_cooldown_sec > 0
        && last_mid_unstable_at
            .map(|t| now_ms.saturating_sub(t) < thresholds.mid_unstable_cooldown_sec * 1000)
            .unwrap_or(false);

    if (mid_unstable || mid_cooldown) && !inputs.has_orders {
        return QuoteState::MidWait;
    }
    if inputs.has_orders && derived.effective_drift_bps > thresholds.drift_threshold_bps {
        return QuoteState::Rebalancing;
    }
    if inputs.has_orders {
        return QuoteState::Monitoring;
    }
    QuoteState::Placing
}

/// Whether the order manager's current pair (if any) may be touched this
/// tick: either there are no orders yet, or `min_wait_sec` has elapsed since
/// `orders_exist_since` (§4.3, "Time gate").
pub fn can_modify(now_ms: u64, orders_exist_since: Option<u64>, min_wait_sec: u64) -> bool {
    match orders_exist_since {
        None => true,
        Some(since) => now_ms.saturating_sub(since) >= min_wait_sec * 1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(bid: Decimal, ask: Decimal) -> OrderBookSnapshot {
        OrderBookSnapshot {
            best_bid_price: bid,
            best_bid_size: dec!(1),
            best_ask_price: ask,
            best_ask_size: dec!(1),
        }
    }

    fn thresholds() -> QuotingThresholds {
        QuotingThresholds {
            spread_bps: dec!(8),
            drift_threshold_bps: dec!(3),
            use_mid_drift: false,
            mark_mid_diff_limit_bps: dec!(0),
            mid_unstable_cooldown_sec: 0,
            min_wait_sec: 3,
            leverage: dec!(6),
            size_unit: dec!(0.0001),
            max_size: Some(dec!(0.0002)),
        }
    }

    #[test]
    fn no_size_when_collateral_yields_zero() {
        let inputs = QuotingInputs {
            mark: dec!(100000),
            book: book(dec!(99999), dec!(100001)),
            has_orders: false,
            reference_price: dec!(100000),
            available_collateral: dec!(0),
            total_collateral: dec!(0),
        };
        let th = thresholds();
        let derived = derive(&inputs, &th);
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::NoSize);
    }

    #[test]
    fn waiting_when_spread_would_cross_book() {
        // spread_bps=8 at mark=100000 -> buy=99920, sell=100080.
        // A tight book (bid=99999, ask=100001) still leaves both maker; force
        // taker by tightening the book past the quote prices.
        let inputs = QuotingInputs {
            mark: dec!(100000),
            book: book(dec!(99999), dec!(99921)), // crossed ask < buy price
            has_orders: false,
            reference_price: dec!(100000),
            available_collateral: dec!(10000),
            total_collateral: dec!(10000),
        };
        let th = thresholds();
        let derived = derive(&inputs, &th);
        assert!(!derived.sell_maker || !derived.buy_maker);
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::Waiting);
    }

    #[test]
    fn placing_when_no_orders_and_conditions_met() {
        let inputs = QuotingInputs {
            mark: dec!(100000),
            book: book(dec!(99999), dec!(100001)),
            has_orders: false,
            reference_price: dec!(100000),
            available_collateral: dec!(10000),
            total_collateral: dec!(10000),
        };
        let th = thresholds();
        let derived = derive(&inputs, &th);
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::Placing);
    }

    #[test]
    fn monitoring_when_orders_exist_and_drift_small() {
        let inputs = QuotingInputs {
            mark: dec!(100000),
            book: book(dec!(99999), dec!(100001)),
            has_orders: true,
            reference_price: dec!(100000),
            available_collateral: dec!(10000),
            total_collateral: dec!(10000),
        };
        let th = thresholds();
        let derived = derive(&inputs, &th);
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::Monitoring);
    }

    #[test]
    fn rebalancing_when_drift_exceeds_threshold() {
        let inputs = QuotingInputs {
            mark: dec!(100040), // 4bps drift from ref 100000, threshold 3
            book: book(dec!(100039), dec!(100041)),
            has_orders: true,
            reference_price: dec!(100000),
            available_collateral: dec!(10000),
            total_collateral: dec!(10000),
        };
        let th = thresholds();
        let derived = derive(&inputs, &th);
        assert_eq!(derived.drift_bps, dec!(4));
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::Rebalancing);
    }

    #[test]
    fn mid_wait_when_unstable_and_no_orders() {
        let mut th = thresholds();
        th.mark_mid_diff_limit_bps = dec!(2);
        let inputs = QuotingInputs {
            mark: dec!(100000),
            book: book(dec!(99899), dec!(99901)), // mid ~99900, 100bps away
            has_orders: false,
            reference_price: dec!(100000),
            available_collateral: dec!(10000),
            total_collateral: dec!(10000),
        };
        let derived = derive(&inputs, &th);
        assert_eq!(classify(&derived, &inputs, &th, 0, None), QuoteState::MidWait);
    }

    #[test]
    fn can_modify_respects_min_wait() {
        assert!(can_modify(10_000, None, 3));
        assert!(!can_modify(10_000, Some(9_000), 3));
        assert!(can_modify(13_000, Some(9_000), 3));
    }
}
