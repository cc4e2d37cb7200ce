//! Core data model: orders, book snapshots, ticks, positions, collateral.
//!
//! Mirrors the teacher's `execution::types` module but expressed against
//! this spec's semantics: orders rest until explicitly observed filled or
//! cancelled (no instant-fill simulation), and every order carries a
//! reference price that is fixed at placement and never mutated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Client-generated order identifier. `MM-` prefixes quoting orders,
/// `CLOSE-` prefixes unwind orders (see [`OrderId::quote`] / [`OrderId::close`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn quote(side: Side) -> Self {
        Self(format!("MM-{}-{}", side.tag(), random_suffix()))
    }

    pub fn close(side: Side) -> Self {
        Self(format!("CLOSE-{}-{}", side.tag(), random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn random_suffix() -> String {
    use rand::Rng;
    let n: u64 = rand::thread_rng().gen();
    format!("{:016x}", n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    fn tag(self) -> &'static str {
        match self {
            Side::Buy => "B",
            Side::Sell => "S",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

/// A resting order. The `reference_price` is sampled at placement and is
/// never overwritten for the lifetime of the order (see `SPEC_FULL.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub status: OrderStatus,
    pub placed_at: SystemTime,
    pub reference_price: Decimal,
}

impl Order {
    pub fn new(id: OrderId, side: Side, price: Decimal, size: Decimal, reference_price: Decimal) -> Self {
        Self {
            id,
            side,
            price,
            size,
            status: OrderStatus::Open,
            placed_at: SystemTime::now(),
            reference_price,
        }
    }
}

/// Immutable top-of-book snapshot. `best_bid_price < best_ask_price` and
/// both sizes are `>= 0` is an invariant of well-formed input; callers that
/// cannot guarantee it must treat the tick as a market-data gap instead of
/// constructing this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub best_bid_price: Decimal,
    pub best_bid_size: Decimal,
    pub best_ask_price: Decimal,
    pub best_ask_size: Decimal,
}

impl OrderBookSnapshot {
    pub fn is_valid(&self) -> bool {
        self.best_bid_price > Decimal::ZERO
            && self.best_ask_price > Decimal::ZERO
            && self.best_bid_price < self.best_ask_price
            && self.best_bid_size >= Decimal::ZERO
            && self.best_ask_size >= Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

/// `size == 0` is semantically "no position"; see [`Position::is_flat`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            side: PositionSide::Long,
            size: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// The side an unwind must trade to return this position to flat.
    pub fn close_side(&self) -> Side {
        match self.side {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collateral {
    pub total: Decimal,
    pub available: Decimal,
}

/// A market tick sampled together per iteration (tolerates individual
/// fields being stale by <= one tick relative to each other).
#[derive(Debug, Clone, Copy)]
pub struct MarketTick {
    pub mark_price: Decimal,
    pub book: OrderBookSnapshot,
    pub position: Position,
    pub collateral: Collateral,
}
