//! The order manager (component C2): a uniform contract over a Simulated
//! backend (in-memory bookkeeping) and a Live backend (delegates to the
//! exchange, caches the server's view). Owns the per-side reference price
//! table.
//!
//! The two backends are dispatched through a tagged enum, not `Box<dyn
//! Trait>`, per the design note this crate follows for this seam: the
//! variant is resolved once at startup from configuration and never changes
//! for the life of the process, so dynamic dispatch buys nothing. Grounded
//! on the shape of the teacher's `execution::{simulated, lighter}` pair, with
//! `HashMap`-backed order bookkeeping in the same style as
//! `SimulatedExecutor`.

use crate::error::{AgentError, AgentResult};
use crate::exchange::{order_from_cache, CreateOrderRequest, ExchangeAdapter};
use crate::model::{Order, OrderId, OrderStatus, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// In-memory bookkeeping backend. Orders never fill themselves; a tick's
/// position read is the only source of truth for whether a fill happened
/// (see [`crate::orchestrator`]), so this backend simply rests orders until
/// told to cancel them.
#[derive(Default)]
struct SimulatedBackend {
    orders: HashMap<Side, Order>,
}

/// Delegates to an [`ExchangeAdapter`] and caches the server's view of open
/// orders, one per side, so repeated reads don't round-trip to the exchange.
struct LiveBackend {
    adapter: Arc<dyn ExchangeAdapter>,
    symbol: String,
    cache: HashMap<Side, Order>,
}

/// Polymorphic order manager (§4.2). Resolved once at startup from
/// configuration.
pub enum OrderManager {
    Simulated(SimulatedBackend),
    Live(LiveBackend),
}

impl OrderManager {
    pub fn simulated() -> Self {
        OrderManager::Simulated(SimulatedBackend::default())
    }

    pub fn live(adapter: Arc<dyn ExchangeAdapter>, symbol: impl Into<String>) -> Self {
        OrderManager::Live(LiveBackend {
            adapter,
            symbol: symbol.into(),
            cache: HashMap::new(),
        })
    }

    /// Places a single order on `side`. On success, `R[side]` is updated to
    /// `reference_price` and the `placed` counter is bumped; on failure,
    /// state is left untouched.
    pub async fn place(
        &mut self,
        side: Side,
        price: Decimal,
        size: Decimal,
        reference_price: Decimal,
    ) -> AgentResult<()> {
        let id = OrderId::quote(side);
        match self {
            OrderManager::Simulated(backend) => {
                let order = Order::new(id.clone(), side, price, size, reference_price);
                info!(%id, %side, %price, %size, "placed simulated order");
                backend.orders.insert(side, order);
                Ok(())
            }
            OrderManager::Live(backend) => {
                let request = CreateOrderRequest {
                    side,
                    amount: size,
                    price: Some(price),
                    client_order_id: id.clone(),
                    is_reduce_only: false,
                };
                let response = backend.adapter.create_order(&backend.symbol, request).await?;
                if !response.is_accepted() {
                    warn!(%id, code = response.code, message = %response.message, "order rejected");
                    return Err(AgentError::OrderRejected {
                        code: response.code,
                        message: response.message,
                    });
                }
                let order = Order::new(id.clone(), side, price, size, reference_price);
                info!(%id, %side, %price, %size, "placed live order");
                backend.cache.insert(side, order);
                Ok(())
            }
        }
    }

    /// Places both sides concurrently, per §5's ordering note: the two
    /// `place` calls race independently and either may fail without
    /// affecting the other, so the pair-atomicity invariant can be briefly
    /// broken between ticks.
    pub async fn place_pair(
        &mut self,
        buy_price: Decimal,
        sell_price: Decimal,
        size: Decimal,
        reference_price: Decimal,
    ) -> (AgentResult<()>, AgentResult<()>) {
        match self {
            OrderManager::Simulated(backend) => {
                backend.orders.insert(
                    Side::Buy,
                    Order::new(OrderId::quote(Side::Buy), Side::Buy, buy_price, size, reference_price),
                );
                backend.orders.insert(
                    Side::Sell,
                    Order::new(OrderId::quote(Side::Sell), Side::Sell, sell_price, size, reference_price),
                );
                info!(%buy_price, %sell_price, %size, "placed simulated pair");
                (Ok(()), Ok(()))
            }
            OrderManager::Live(backend) => {
                let buy_id = OrderId::quote(Side::Buy);
                let sell_id = OrderId::quote(Side::Sell);
                let buy_request = CreateOrderRequest {
                    side: Side::Buy,
                    amount: size,
                    price: Some(buy_price),
                    client_order_id: buy_id.clone(),
                    is_reduce_only: false,
                };
                let sell_request = CreateOrderRequest {
                    side: Side::Sell,
                    amount: size,
                    price: Some(sell_price),
                    client_order_id: sell_id.clone(),
                    is_reduce_only: false,
                };
                let (buy_resp, sell_resp) = tokio::join!(
                    backend.adapter.create_order(&backend.symbol, buy_request),
                    backend.adapter.create_order(&backend.symbol, sell_request),
                );
                let buy_result = Self::accept_live(
                    &mut backend.cache,
                    buy_resp,
                    Side::Buy,
                    buy_id,
                    buy_price,
                    size,
                    reference_price,
                );
                let sell_result = Self::accept_live(
                    &mut backend.cache,
                    sell_resp,
                    Side::Sell,
                    sell_id,
                    sell_price,
                    size,
                    reference_price,
                );
                (buy_result, sell_result)
            }
        }
    }

    fn accept_live(
        cache: &mut HashMap<Side, Order>,
        response: AgentResult<crate::exchange::CreateOrderResponse>,
        side: Side,
        id: OrderId,
        price: Decimal,
        size: Decimal,
        reference_price: Decimal,
    ) -> AgentResult<()> {
        let response = response?;
        if !response.is_accepted() {
            warn!(%id, code = response.code, message = %response.message, "order rejected");
            return Err(AgentError::OrderRejected {
                code: response.code,
                message: response.message,
            });
        }
        info!(%id, %side, %price, %size, "placed live order");
        cache.insert(side, Order::new(id, side, price, size, reference_price));
        Ok(())
    }

    /// Cancels all orders this manager currently holds and clears the
    /// reference-price table. Live variant cancels its cached orders rather
    /// than issuing a symbol-wide cancel, to avoid racing freshly placed
    /// quotes with a stale cancel-all. Failures clear local state anyway.
    pub async fn cancel_all(&mut self, reason: &str) -> u32 {
        match self {
            OrderManager::Simulated(backend) => {
                let count = backend.orders.len() as u32;
                if count > 0 {
                    info!(reason, count, "cancelled simulated orders");
                }
                backend.orders.clear();
                count
            }
            OrderManager::Live(backend) => {
                let open: Vec<_> = backend
                    .cache
                    .values()
                    .map(|o| crate::exchange::OpenOrder {
                        client_order_id: o.id.clone(),
                        exchange_order_id: o.id.to_string(),
                        side: o.side,
                        price: o.price,
                        size: o.size,
                    })
                    .collect();
                let count = open.len() as u32;
                if count > 0 {
                    if let Err(err) = backend.adapter.cancel_orders(&backend.symbol, &open).await {
                        warn!(reason, %err, "cancel_all failed, clearing local cache anyway");
                    } else {
                        info!(reason, count, "cancelled live orders");
                    }
                }
                backend.cache.clear();
                count
            }
        }
    }

    /// Issues a symbol-wide cancel regardless of the local cache; used only
    /// on the final shutdown path (§6), not by the per-tick control loop.
    pub async fn cancel_all_on_shutdown(&mut self) {
        if let OrderManager::Live(backend) = self {
            if let Err(err) = backend.adapter.cancel_all_orders(&backend.symbol).await {
                warn!(%err, "shutdown cancel_all_orders failed");
            }
        }
        self.cancel_all("shutdown").await;
    }

    /// Live only: refreshes the cache from the exchange, keeping at most one
    /// order per side.
    pub async fn fetch_open(&mut self) -> AgentResult<()> {
        if let OrderManager::Live(backend) = self {
            let open = backend.adapter.get_open_orders(&backend.symbol).await?;
            let mut fresh = HashMap::new();
            for o in open {
                let reference = backend
                    .cache
                    .get(&o.side)
                    .map(|existing| existing.reference_price)
                    .unwrap_or(o.price);
                fresh.entry(o.side).or_insert_with(|| order_from_cache(&o, reference));
            }
            backend.cache = fresh;
        }
        Ok(())
    }

    pub fn get_order(&self, side: Side) -> Option<Order> {
        match self {
            OrderManager::Simulated(backend) => backend.orders.get(&side).cloned(),
            OrderManager::Live(backend) => backend.cache.get(&side).cloned(),
        }
    }

    pub fn has_orders(&self) -> bool {
        match self {
            OrderManager::Simulated(backend) => !backend.orders.is_empty(),
            OrderManager::Live(backend) => !backend.cache.is_empty(),
        }
    }

    /// Marks one order `Filled` locally once the orchestrator observes it
    /// left the exchange's (or the simulated table's) open set.
    pub fn mark_filled(&mut self, side: Side) {
        match self {
            OrderManager::Simulated(backend) => {
                if let Some(order) = backend.orders.get_mut(&side) {
                    order.status = OrderStatus::Filled;
                }
            }
            OrderManager::Live(backend) => {
                if let Some(order) = backend.cache.get_mut(&side) {
                    order.status = OrderStatus::Filled;
                }
            }
        }
    }
}

/// Observability-only counters; never consulted for control-flow decisions
/// (§4.3: "Counters ... are observability only; they never gate logic").
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderManagerStats {
    pub placed: u64,
    pub cancelled: u64,
    pub rebalanced: u64,
}

impl OrderManagerStats {
    pub fn note_placed(&mut self) {
        self.placed += 1;
    }

    pub fn note_cancelled(&mut self, count: u32) {
        self.cancelled += count as u64;
    }

    pub fn rebalance_noted(&mut self) {
        self.rebalanced += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn simulated_place_and_get_order() {
        let mut mgr = OrderManager::simulated();
        mgr.place(Side::Buy, dec!(99935), dec!(0.001), dec!(100000))
            .await
            .unwrap();
        let order = mgr.get_order(Side::Buy).unwrap();
        assert_eq!(order.price, dec!(99935));
        assert_eq!(order.reference_price, dec!(100000));
        assert!(mgr.has_orders());
    }

    #[tokio::test]
    async fn cancel_all_clears_table_and_reports_count() {
        let mut mgr = OrderManager::simulated();
        mgr.place(Side::Buy, dec!(99935), dec!(0.001), dec!(100000))
            .await
            .unwrap();
        mgr.place(Side::Sell, dec!(100065), dec!(0.001), dec!(100000))
            .await
            .unwrap();
        let count = mgr.cancel_all("drift").await;
        assert_eq!(count, 2);
        assert!(!mgr.has_orders());
    }

    #[tokio::test]
    async fn place_pair_sets_both_sides_with_same_reference() {
        let mut mgr = OrderManager::simulated();
        let (buy, sell) = mgr
            .place_pair(dec!(99935), dec!(100065), dec!(0.001), dec!(100000))
            .await;
        buy.unwrap();
        sell.unwrap();
        assert_eq!(mgr.get_order(Side::Buy).unwrap().reference_price, dec!(100000));
        assert_eq!(mgr.get_order(Side::Sell).unwrap().reference_price, dec!(100000));
    }
}
