//! The exchange adapter contract (§6).
//!
//! The control core never talks to a specific venue's wire protocol; it only
//! calls [`ExchangeAdapter`]. [`http::HttpAdapter`] is a reference
//! implementation against a generic REST+WS shape, grounded on the `agent`
//! crate's reqwest/tokio-tungstenite client and kept deliberately thin per
//! `SPEC_FULL.md` §1 ("out of scope, referenced only by contract").

pub mod http;

use crate::error::AgentResult;
use crate::model::{Collateral, Order, OrderBookSnapshot, OrderId, Position, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// A single open order as reported by the exchange (no reference price —
/// that is the order manager's bookkeeping, not the venue's).
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub client_order_id: OrderId,
    pub exchange_order_id: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
}

/// `create_order` parameters. `price: None` means a market order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub side: Side,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub client_order_id: OrderId,
    pub is_reduce_only: bool,
}

/// `{code, message}`; `code == 0` is acceptance (§6).
#[derive(Debug, Clone)]
pub struct CreateOrderResponse {
    pub code: i64,
    pub message: String,
}

impl CreateOrderResponse {
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

/// External collaborator contract consumed by the control core. See
/// `SPEC_FULL.md` §6 for the operation table this trait mirrors.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn get_mark_price(&self, symbol: &str) -> AgentResult<Decimal>;
    async fn get_orderbook(&self, symbol: &str) -> AgentResult<OrderBookSnapshot>;
    async fn get_position(&self, symbol: &str) -> AgentResult<Option<Position>>;
    async fn get_collateral(&self) -> AgentResult<Collateral>;
    async fn get_open_orders(&self, symbol: &str) -> AgentResult<Vec<OpenOrder>>;
    async fn create_order(
        &self,
        symbol: &str,
        request: CreateOrderRequest,
    ) -> AgentResult<CreateOrderResponse>;
    async fn cancel_order(&self, client_order_id: &OrderId) -> AgentResult<()>;
    async fn cancel_orders(&self, symbol: &str, orders: &[OpenOrder]) -> AgentResult<()>;
    async fn cancel_all_orders(&self, symbol: &str) -> AgentResult<()>;
    async fn close_position(&self, symbol: &str, position: &Position) -> AgentResult<()>;
}

/// Joins a cached server-side [`OpenOrder`] with the order manager's
/// separately-owned reference price into the domain [`Order`] the rest of
/// the core operates on. See `SPEC_FULL.md` §9 ("Reference-price ownership").
pub fn order_from_cache(open: &OpenOrder, reference_price: Decimal) -> Order {
    Order::new(
        open.client_order_id.clone(),
        open.side,
        open.price,
        open.size,
        reference_price,
    )
}
