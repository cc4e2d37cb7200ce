//! Control core for a single-symbol perpetual futures market-making agent.
//!
//! Module layout mirrors the teacher's `bog-core` crate: one file per
//! concern, a small prelude for the types call sites reach for most often,
//! and a `testing` module that's public (not `#[cfg(test)]`-gated) so
//! downstream integration tests can use the same doubles these unit tests
//! do.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod exchange;
pub mod model;
pub mod order_manager;
pub mod orchestrator;
pub mod position_log;
pub mod pricing;
pub mod quoting;
pub mod snapshot;
pub mod testing;
pub mod unwind;

pub mod prelude {
    pub use crate::config::{CloseMethod, Config, Mode};
    pub use crate::error::{AgentError, AgentResult};
    pub use crate::exchange::ExchangeAdapter;
    pub use crate::model::{Collateral, MarketTick, Order, OrderBookSnapshot, OrderId, Position, PositionSide, Side};
    pub use crate::order_manager::{OrderManager, OrderManagerStats};
    pub use crate::orchestrator::{Orchestrator, TickOutcome};
    pub use crate::quoting::QuoteState;
}
