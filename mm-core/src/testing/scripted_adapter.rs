//! A scripted [`ExchangeAdapter`] that replays a fixed sequence of ticks and
//! records every order submitted against it, for quoting/unwind/orchestrator
//! tests that need deterministic market data without a real venue.

use crate::error::{AgentError, AgentResult};
use crate::exchange::{CreateOrderRequest, CreateOrderResponse, ExchangeAdapter, OpenOrder};
use crate::model::{Collateral, OrderBookSnapshot, OrderId, Position, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Mutex;

/// One scripted tick's worth of market data. Fields default to a sane flat
/// book at mark 100000 with no position so a test only needs to override
/// what it cares about (`ScriptedTick { mark_price: dec!(100040), ..ScriptedTick::default() }`).
#[derive(Debug, Clone)]
pub struct ScriptedTick {
    pub mark_price: Decimal,
    pub book: OrderBookSnapshot,
    pub position: Option<Position>,
    pub collateral: Collateral,
}

impl Default for ScriptedTick {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            mark_price: dec!(100000),
            book: OrderBookSnapshot {
                best_bid_price: dec!(99999),
                best_bid_size: dec!(1),
                best_ask_price: dec!(100001),
                best_ask_size: dec!(1),
            },
            position: None,
            collateral: Collateral {
                total: dec!(10000),
                available: dec!(10000),
            },
        }
    }
}

/// A submitted order, recorded for assertions.
#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub side: Side,
    pub price: Option<Decimal>,
    pub size: Decimal,
    pub is_reduce_only: bool,
    pub client_order_id: OrderId,
}

struct State {
    ticks: Vec<ScriptedTick>,
    cursor: usize,
    created: Vec<RecordedOrder>,
    cancelled: Vec<OrderId>,
    open_orders: Vec<OpenOrder>,
    reject_next_create: bool,
}

pub struct ScriptedAdapter {
    state: Mutex<State>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                ticks: vec![ScriptedTick::default()],
                cursor: 0,
                created: Vec::new(),
                cancelled: Vec::new(),
                open_orders: Vec::new(),
                reject_next_create: false,
            }),
        }
    }

    /// Replays `ticks` in order, holding on the last one once exhausted.
    pub fn with_ticks(ticks: Vec<ScriptedTick>) -> Self {
        let adapter = Self::new();
        adapter.state.lock().unwrap().ticks = ticks;
        adapter
    }

    pub fn set_open_orders(&self, orders: Vec<OpenOrder>) {
        self.state.lock().unwrap().open_orders = orders;
    }

    pub fn reject_next_create(&self) {
        self.state.lock().unwrap().reject_next_create = true;
    }

    pub fn created_orders(&self) -> Vec<RecordedOrder> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn cancelled_orders(&self) -> Vec<OrderId> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// Advances to the next scripted tick, clamping at the last one.
    pub fn advance(&self) {
        let mut state = self.state.lock().unwrap();
        if state.cursor + 1 < state.ticks.len() {
            state.cursor += 1;
        }
    }

    fn current(&self) -> ScriptedTick {
        let state = self.state.lock().unwrap();
        state.ticks[state.cursor].clone()
    }
}

impl Default for ScriptedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for ScriptedAdapter {
    async fn get_mark_price(&self, _symbol: &str) -> AgentResult<Decimal> {
        Ok(self.current().mark_price)
    }

    async fn get_orderbook(&self, _symbol: &str) -> AgentResult<OrderBookSnapshot> {
        Ok(self.current().book)
    }

    async fn get_position(&self, _symbol: &str) -> AgentResult<Option<Position>> {
        Ok(self.current().position)
    }

    async fn get_collateral(&self) -> AgentResult<Collateral> {
        Ok(self.current().collateral)
    }

    async fn get_open_orders(&self, _symbol: &str) -> AgentResult<Vec<OpenOrder>> {
        Ok(self.state.lock().unwrap().open_orders.clone())
    }

    async fn create_order(
        &self,
        _symbol: &str,
        request: CreateOrderRequest,
    ) -> AgentResult<CreateOrderResponse> {
        let mut state = self.state.lock().unwrap();
        if state.reject_next_create {
            state.reject_next_create = false;
            return Err(AgentError::OrderRejected {
                code: 1,
                message: "scripted rejection".to_string(),
            });
        }
        state.created.push(RecordedOrder {
            side: request.side,
            price: request.price,
            size: request.amount,
            is_reduce_only: request.is_reduce_only,
            client_order_id: request.client_order_id,
        });
        Ok(CreateOrderResponse {
            code: 0,
            message: "ok".to_string(),
        })
    }

    async fn cancel_order(&self, client_order_id: &OrderId) -> AgentResult<()> {
        self.state.lock().unwrap().cancelled.push(client_order_id.clone());
        Ok(())
    }

    async fn cancel_orders(&self, _symbol: &str, orders: &[OpenOrder]) -> AgentResult<()> {
        let mut state = self.state.lock().unwrap();
        for o in orders {
            state.cancelled.push(o.client_order_id.clone());
        }
        Ok(())
    }

    async fn cancel_all_orders(&self, _symbol: &str) -> AgentResult<()> {
        Ok(())
    }

    async fn close_position(&self, _symbol: &str, position: &Position) -> AgentResult<()> {
        let mut state = self.state.lock().unwrap();
        state.created.push(RecordedOrder {
            side: position.close_side(),
            price: None,
            size: position.size,
            is_reduce_only: true,
            client_order_id: OrderId::close(position.close_side()),
        });
        Ok(())
    }
}
