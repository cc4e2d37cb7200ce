//! Pure pricing utilities (component C1).
//!
//! Every function here is pure and total: no I/O, no mutable state, decimal
//! arithmetic throughout so equality and ordering comparisons used by the
//! maker/taker classification are exact. Grounded on the quote/spread math in
//! the teacher's `strategy::simple_spread` and `orderbook::l2_book` modules,
//! generalized from `f64` basis points to `Decimal`.

use crate::model::OrderBookSnapshot;
use rust_decimal::Decimal;

fn bps_denom() -> Decimal {
    Decimal::new(10_000, 0)
}

fn two() -> Decimal {
    Decimal::new(2, 0)
}

/// `buy = mark * (1 - spread_bps / 10_000)`, `sell = mark * (1 + spread_bps / 10_000)`.
pub fn quote_prices(mark: Decimal, spread_bps: Decimal) -> (Decimal, Decimal) {
    let factor = spread_bps / bps_denom();
    (mark * (Decimal::ONE - factor), mark * (Decimal::ONE + factor))
}

/// Distance in bps between `current` and `reference`. Zero iff `reference == 0`.
pub fn drift_bps(current: Decimal, reference: Decimal) -> Decimal {
    if reference.is_zero() {
        return Decimal::ZERO;
    }
    ((current - reference).abs() / reference) * bps_denom()
}

/// Observed book spread in bps relative to the book's arithmetic mid.
pub fn book_spread_bps(bid: Decimal, ask: Decimal) -> Decimal {
    if bid.is_zero() {
        return Decimal::ZERO;
    }
    let mid = (ask + bid) / two();
    ((ask - bid) / mid) * bps_denom()
}

/// Size-weighted mid of the top of book; falls back to the arithmetic mid
/// when both sizes are zero.
pub fn weighted_mid(book: &OrderBookSnapshot) -> Decimal {
    let total = book.best_bid_size + book.best_ask_size;
    if total.is_zero() {
        return (book.best_bid_price + book.best_ask_price) / two();
    }
    (book.best_bid_price * book.best_bid_size + book.best_ask_price * book.best_ask_size) / total
}

/// A buy is maker iff it rests below the ask; a sell is maker iff it rests
/// above the bid. Equality counts as taker (crossing on touch).
pub fn maker_classification(
    buy_price: Decimal,
    sell_price: Decimal,
    best_bid: Decimal,
    best_ask: Decimal,
) -> (bool, bool) {
    (buy_price < best_ask, sell_price > best_bid)
}

/// `raw = available * leverage / 2 / mark`, capped by `max_size` when set,
/// then snapped to the nearest multiple of `unit` (round, not floor — the
/// source rounds to absorb floating-point/decimal noise near a unit boundary).
/// Returns zero when `available <= 0` or `mark <= 0`.
pub fn quantize_size(
    available: Decimal,
    mark: Decimal,
    leverage: Decimal,
    unit: Decimal,
    max_size: Option<Decimal>,
) -> Decimal {
    if available <= Decimal::ZERO || mark <= Decimal::ZERO || unit <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut raw = available * leverage / two() / mark;
    if let Some(max) = max_size {
        if raw > max {
            raw = max;
        }
    }

    let units = (raw / unit).round();
    (units * unit).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_prices_straddle_mark() {
        let (buy, sell) = quote_prices(dec!(100000), dec!(6.5));
        assert_eq!(buy, dec!(99935));
        assert_eq!(sell, dec!(100065));
        assert!(buy < dec!(100000));
        assert!(sell > dec!(100000));
    }

    #[test]
    fn quote_prices_always_straddle_for_positive_inputs() {
        for mark in [dec!(1), dec!(50000), dec!(123456.789)] {
            for spread in [dec!(0.5), dec!(1), dec!(8), dec!(50)] {
                let (buy, sell) = quote_prices(mark, spread);
                assert!(buy < mark);
                assert!(mark < sell);
            }
        }
    }

    #[test]
    fn drift_is_zero_for_zero_reference() {
        assert_eq!(drift_bps(dec!(100), dec!(0)), dec!(0));
    }

    #[test]
    fn drift_is_zero_when_equal() {
        for p in [dec!(1), dec!(99999.99), dec!(0.0001)] {
            assert_eq!(drift_bps(p, p), dec!(0));
        }
    }

    #[test]
    fn drift_example() {
        // ref=100000, mark=100040 -> 4 bps
        assert_eq!(drift_bps(dec!(100040), dec!(100000)), dec!(4));
    }

    #[test]
    fn book_spread_bps_zero_bid() {
        assert_eq!(book_spread_bps(dec!(0), dec!(100)), dec!(0));
    }

    #[test]
    fn weighted_mid_equal_sizes_is_arithmetic_mid() {
        let book = OrderBookSnapshot {
            best_bid_price: dec!(99994),
            best_bid_size: dec!(1),
            best_ask_price: dec!(100006),
            best_ask_size: dec!(1),
        };
        assert_eq!(weighted_mid(&book), dec!(100000));
    }

    #[test]
    fn weighted_mid_falls_back_when_sizes_zero() {
        let book = OrderBookSnapshot {
            best_bid_price: dec!(100),
            best_bid_size: dec!(0),
            best_ask_price: dec!(102),
            best_ask_size: dec!(0),
        };
        assert_eq!(weighted_mid(&book), dec!(101));
    }

    #[test]
    fn maker_classification_matches_definition() {
        let (buy_maker, sell_maker) = maker_classification(dec!(99), dec!(101), dec!(100), dec!(100));
        // buy(99) < ask(100) -> maker; sell(101) > bid(100) -> maker
        assert!(buy_maker);
        assert!(sell_maker);

        // equality counts as taker
        let (buy_maker, sell_maker) = maker_classification(dec!(100), dec!(100), dec!(100), dec!(100));
        assert!(!buy_maker);
        assert!(!sell_maker);
    }

    #[test]
    fn maker_classification_boundary_scenario_taker_avoidance() {
        // mark=100000, spread_bps=1, bid=99999, ask=100001
        let (buy, sell) = quote_prices(dec!(100000), dec!(1));
        let (buy_maker, sell_maker) = maker_classification(buy, sell, dec!(99999), dec!(100001));
        assert!(buy_maker);
        assert!(sell_maker);
    }

    #[test]
    fn maker_classification_crossed_book_is_taker() {
        // resting orders, book crossed so sell(100000) <= bid(100000)
        let (_, sell_maker) = maker_classification(dec!(99990), dec!(100000), dec!(100000), dec!(100010));
        assert!(!sell_maker);
    }

    #[test]
    fn quantize_size_snaps_to_unit_and_rounds() {
        // available=10000, mark=50000, leverage=6, unit=0.0001
        // raw = 10000*6/2/50000 = 0.6
        let size = quantize_size(dec!(10000), dec!(50000), dec!(6), dec!(0.0001), None);
        assert_eq!(size, dec!(0.6000));
    }

    #[test]
    fn quantize_size_caps_at_max() {
        let size = quantize_size(dec!(1_000_000), dec!(50000), dec!(6), dec!(0.0001), Some(dec!(0.0002)));
        assert_eq!(size, dec!(0.0002));
    }

    #[test]
    fn quantize_size_zero_for_nonpositive_inputs() {
        assert_eq!(quantize_size(dec!(-1), dec!(50000), dec!(6), dec!(0.0001), None), dec!(0));
        assert_eq!(quantize_size(dec!(100), dec!(0), dec!(6), dec!(0.0001), None), dec!(0));
        assert_eq!(quantize_size(dec!(0), dec!(50000), dec!(6), dec!(0.0001), None), dec!(0));
    }

    #[test]
    fn quantize_size_is_nonnegative_multiple_of_unit() {
        let unit = dec!(0.0001);
        let size = quantize_size(dec!(123.456), dec!(789.1), dec!(3.3), unit, Some(dec!(1.0)));
        assert!(size >= Decimal::ZERO);
        assert!(size <= dec!(1.0));
        assert_eq!(size % unit, Decimal::ZERO);
    }
}
