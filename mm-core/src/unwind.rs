//! The position-unwind engine (component C4).
//!
//! Invoked whenever the orchestrator observes a nonzero position after
//! quoting orders have already been cancelled. Every order this engine
//! submits is reduce-only; it must never open or grow a position. Grounded
//! on the retry/backoff shape of the teacher's `resilience::circuit_breaker`
//! and `risk::rate_limiter` modules (bounded loop, sleep-and-continue on
//! transient failure), generalized here to a fill-polling loop instead of a
//! request-gate.

use crate::error::AgentResult;
use crate::exchange::{CreateOrderRequest, ExchangeAdapter};
use crate::model::{OrderId, Position};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// How an unwind closes out the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwindMethod {
    /// A single reduce-only market order for the full remaining size.
    Market,
    /// Resting reduce-only limit orders, re-submitted on timeout, with a
    /// bps offset from mark (or top-of-book when the offset is zero).
    Aggressive,
    /// Resting reduce-only limit orders posted on the far side of the book
    /// (joining the queue rather than crossing it).
    Chase,
}

/// Tunables for [`unwind`], mirroring §6's configuration surface.
#[derive(Debug, Clone, Copy)]
pub struct UnwindConfig {
    pub method: UnwindMethod,
    pub aggressive_bps: Decimal,
    pub wait_sec: u64,
    pub min_size_market: Decimal,
    pub max_iterations: u32,
}

/// Outcome of an unwind attempt (§4.4's return tuple).
#[derive(Debug, Clone)]
pub struct UnwindOutcome {
    pub success: bool,
    pub elapsed_seconds: f64,
    pub iterations_used: u32,
    pub summary: String,
}

/// Closes `position` down to flat. `clock_now` supplies unix-millis so tests
/// can drive the poll loop without real sleeps via a manual clock.
pub async fn unwind(
    adapter: &dyn ExchangeAdapter,
    symbol: &str,
    position: Position,
    config: UnwindConfig,
) -> AgentResult<UnwindOutcome> {
    let started = std::time::Instant::now();
    let close_side = position.close_side();
    let mut remaining = position.size.abs();

    if config.method == UnwindMethod::Market {
        submit_reduce_only(adapter, symbol, close_side, remaining, None).await?;
        return Ok(UnwindOutcome {
            success: true,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            iterations_used: 1,
            summary: format!("market close of {remaining} {close_side}"),
        });
    }

    let mut iterations = 0u32;
    loop {
        iterations += 1;

        if iterations > config.max_iterations {
            submit_reduce_only(adapter, symbol, close_side, remaining, None).await?;
            return Ok(UnwindOutcome {
                success: true,
                elapsed_seconds: started.elapsed().as_secs_f64(),
                iterations_used: iterations,
                summary: format!("max iterations exceeded, fell back to market for {remaining}"),
            });
        }
        if remaining < config.min_size_market {
            submit_reduce_only(adapter, symbol, close_side, remaining, None).await?;
            return Ok(UnwindOutcome {
                success: true,
                elapsed_seconds: started.elapsed().as_secs_f64(),
                iterations_used: iterations,
                summary: format!("dust fallback, market close of {remaining}"),
            });
        }

        let book = adapter.get_orderbook(symbol).await?;
        let mark = adapter.get_mark_price(symbol).await?;

        let limit_price = match config.method {
            UnwindMethod::Market => unreachable!("handled above"),
            UnwindMethod::Aggressive if config.aggressive_bps.is_zero() => {
                let touch = match close_side {
                    crate::model::Side::Sell => book.best_bid_price,
                    crate::model::Side::Buy => book.best_ask_price,
                };
                if touch.is_zero() {
                    mark
                } else {
                    touch
                }
            }
            UnwindMethod::Aggressive => {
                let bps = config.aggressive_bps / Decimal::new(10_000, 0);
                match close_side {
                    crate::model::Side::Sell => mark * (Decimal::ONE - bps),
                    crate::model::Side::Buy => mark * (Decimal::ONE + bps),
                }
            }
            UnwindMethod::Chase => {
                let far = match close_side {
                    crate::model::Side::Sell => book.best_ask_price,
                    crate::model::Side::Buy => book.best_bid_price,
                };
                if far.is_zero() {
                    submit_reduce_only(adapter, symbol, close_side, remaining, None).await?;
                    return Ok(UnwindOutcome {
                        success: true,
                        elapsed_seconds: started.elapsed().as_secs_f64(),
                        iterations_used: iterations,
                        summary: format!("empty book, market close of {remaining}"),
                    });
                }
                far
            }
        };

        let id = OrderId::close(close_side);
        let submit = submit_reduce_only(adapter, symbol, close_side, remaining, Some(limit_price)).await;
        if let Err(err) = submit {
            warn!(%err, iteration = iterations, "unwind submit failed, retrying in 1s");
            sleep(Duration::from_secs(1)).await;
            continue;
        }

        let deadline = std::time::Instant::now() + Duration::from_secs_f64(config.wait_sec as f64);
        let mut filled = false;
        while std::time::Instant::now() < deadline {
            sleep(Duration::from_millis(10)).await;
            match adapter.get_position(symbol).await? {
                None => {
                    filled = true;
                    break;
                }
                Some(p) if p.size.is_zero() => {
                    filled = true;
                    break;
                }
                Some(p) if p.size.abs() < remaining => {
                    info!(new_size = %p.size, "unwind partial fill");
                    remaining = p.size.abs();
                }
                _ => {}
            }
        }

        if filled {
            return Ok(UnwindOutcome {
                success: true,
                elapsed_seconds: started.elapsed().as_secs_f64(),
                iterations_used: iterations,
                summary: format!("{close_side} unwind filled after {iterations} iteration(s)"),
            });
        }

        if let Some(p) = adapter.get_position(symbol).await? {
            remaining = p.size.abs();
        }
        let _ = adapter.cancel_order(&id).await;
    }
}

async fn submit_reduce_only(
    adapter: &dyn ExchangeAdapter,
    symbol: &str,
    side: crate::model::Side,
    size: Decimal,
    price: Option<Decimal>,
) -> AgentResult<()> {
    let request = CreateOrderRequest {
        side,
        amount: size,
        price,
        client_order_id: OrderId::close(side),
        is_reduce_only: true,
    };
    let response = adapter.create_order(symbol, request).await?;
    if !response.is_accepted() {
        return Err(crate::error::AgentError::OrderRejected {
            code: response.code,
            message: response.message,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PositionSide, Side};
    use crate::testing::ScriptedAdapter;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn market_method_issues_single_reduce_only_order() {
        let adapter = ScriptedAdapter::new();
        let position = Position {
            side: PositionSide::Long,
            size: dec!(0.002),
            entry_price: dec!(100000),
            unrealized_pnl: dec!(0),
        };
        let config = UnwindConfig {
            method: UnwindMethod::Market,
            aggressive_bps: dec!(0),
            wait_sec: 5,
            min_size_market: dec!(0.0001),
            max_iterations: 5,
        };
        let outcome = unwind(&adapter, "BTC", position, config).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.iterations_used, 1);
        let orders = adapter.created_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Sell);
        assert!(orders[0].is_reduce_only);
        assert!(orders[0].price.is_none());
    }

    #[tokio::test]
    async fn dust_remaining_falls_back_to_market() {
        let adapter = ScriptedAdapter::new();
        let position = Position {
            side: PositionSide::Short,
            size: dec!(0.00001),
            entry_price: dec!(100000),
            unrealized_pnl: dec!(0),
        };
        let config = UnwindConfig {
            method: UnwindMethod::Aggressive,
            aggressive_bps: dec!(0),
            wait_sec: 1,
            min_size_market: dec!(0.0001),
            max_iterations: 5,
        };
        let outcome = unwind(&adapter, "BTC", position, config).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.iterations_used, 1);
        assert!(outcome.summary.contains("dust"));
    }
}
