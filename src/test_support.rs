//! Scripted in-memory exchange for exercising the trading loop without a network.
//!
//! `MockExchange` is cheap to clone; clones share state, so a test can keep a
//! handle while the trader owns another and fill or cancel orders between steps.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ApiResult, Credentials, ExchangeApi};
use crate::config::TraderConfig;
use crate::error::RemoteError;
use crate::models::{ExchangeOrder, OrderStatus, Side, Ticker, Trade};
use crate::pricing::{AveragingMethod, Spread};

#[derive(Debug, Default)]
struct MockState {
    open_orders: Vec<ExchangeOrder>,
    orders: HashMap<String, ExchangeOrder>,
    submitted: Vec<ExchangeOrder>,
    ticker: Option<Ticker>,
    trades: Vec<Trade>,
    /// Calls left to succeed, then the error code to fail with
    fail_after: Option<(usize, String)>,
    calls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockExchange {
    state: Arc<Mutex<MockState>>,
}

/// Config for tests: BTC-LTC, 1 unit, 0.1/0.1 spread, no delay, no prompt
pub fn test_config() -> TraderConfig {
    TraderConfig {
        credentials: Credentials::new("key", "secret"),
        market: "BTC-LTC".to_string(),
        units: Decimal::ONE,
        spread: Spread::default(),
        method: AveragingMethod::Arithmetic,
        delay: Duration::ZERO,
        prompt: false,
    }
}

pub fn trade(rate: Decimal, taker_side: Side) -> Trade {
    Trade {
        id: uuid::Uuid::new_v4().to_string(),
        executed_at: Utc::now(),
        quantity: Decimal::ONE,
        rate,
        taker_side,
    }
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticker bid 0.0034 / ask 0.0035 / last 0.00345; BUY trades average 0.0033
    /// (max 0.0034), SELL trades average 0.0036 (max 0.0037)
    pub fn with_market_data() -> Self {
        let exchange = Self::new();
        exchange.set_ticker(
            Decimal::new(34, 4),
            Decimal::new(35, 4),
            Decimal::new(345, 5),
        );
        exchange.set_trades(vec![
            trade(Decimal::new(32, 4), Side::Buy),
            trade(Decimal::new(35, 4), Side::Sell),
            trade(Decimal::new(34, 4), Side::Buy),
            trade(Decimal::new(37, 4), Side::Sell),
        ]);
        exchange
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_ticker(&self, bid: Decimal, ask: Decimal, last: Decimal) {
        self.lock().ticker = Some(Ticker {
            symbol: "BTC-LTC".to_string(),
            last_trade_rate: last,
            bid_rate: bid,
            ask_rate: ask,
        });
    }

    pub fn set_trades(&self, trades: Vec<Trade>) {
        self.lock().trades = trades;
    }

    /// Remove and return the current trade history
    pub fn take_trades(&self) -> Vec<Trade> {
        std::mem::take(&mut self.lock().trades)
    }

    /// Register an order that is already open before the trader starts
    pub fn add_open_order(&self, side: Side, quantity: Decimal, limit: Decimal) -> String {
        let order = new_order(side, quantity, limit);
        let id = order.id.clone();
        let mut state = self.lock();
        state.orders.insert(id.clone(), order.clone());
        state.open_orders.push(order);
        id
    }

    /// Mark an order fully executed
    pub fn fill(&self, id: &str) {
        self.close(id, true);
    }

    /// Mark an order closed without any fill
    pub fn cancel(&self, id: &str) {
        self.close(id, false);
    }

    fn close(&self, id: &str, filled: bool) {
        let mut state = self.lock();
        if let Some(order) = state.orders.get_mut(id) {
            order.status = OrderStatus::Closed;
            order.fill_quantity = if filled { order.quantity } else { Decimal::ZERO };
        }
        state.open_orders.retain(|o| o.id != id);
    }

    /// Make the next exchange call fail with an API error
    pub fn fail_next(&self, code: &str) {
        self.fail_after(0, code);
    }

    /// Let `calls` more exchange calls succeed, then fail the one after with an API error
    pub fn fail_after(&self, calls: usize, code: &str) {
        self.lock().fail_after = Some((calls, code.to_string()));
    }

    /// Exchange calls made so far, including failed ones
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Orders submitted through `submit_limit_order`, oldest first
    pub fn submitted(&self) -> Vec<ExchangeOrder> {
        self.lock().submitted.clone()
    }

    fn check_failure(&self) -> ApiResult<()> {
        let mut state = self.lock();
        state.calls += 1;
        match state.fail_after.take() {
            Some((0, code)) => Err(RemoteError::Api { status: 400, code }),
            Some((remaining, code)) => {
                state.fail_after = Some((remaining - 1, code));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn new_order(side: Side, quantity: Decimal, limit: Decimal) -> ExchangeOrder {
    ExchangeOrder {
        id: uuid::Uuid::new_v4().to_string(),
        market_symbol: "BTC-LTC".to_string(),
        direction: side,
        order_type: "LIMIT".to_string(),
        quantity,
        limit: Some(limit),
        fill_quantity: Decimal::ZERO,
        status: OrderStatus::Open,
        created_at: Some(Utc::now()),
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    async fn get_open_orders(&self, _market: &str) -> ApiResult<Vec<ExchangeOrder>> {
        self.check_failure()?;
        Ok(self.lock().open_orders.clone())
    }

    async fn get_order(&self, id: &str) -> ApiResult<ExchangeOrder> {
        self.check_failure()?;
        self.lock()
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::Api {
                status: 404,
                code: "ORDER_NOT_FOUND".to_string(),
            })
    }

    async fn get_ticker(&self, _market: &str) -> ApiResult<Ticker> {
        self.check_failure()?;
        self.lock().ticker.clone().ok_or_else(|| RemoteError::Api {
            status: 404,
            code: "MARKET_DOES_NOT_EXIST".to_string(),
        })
    }

    async fn get_recent_trades(&self, _market: &str) -> ApiResult<Vec<Trade>> {
        self.check_failure()?;
        Ok(self.lock().trades.clone())
    }

    async fn submit_limit_order(
        &self,
        _market: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> ApiResult<ExchangeOrder> {
        self.check_failure()?;
        let order = new_order(side, quantity, price);
        let mut state = self.lock();
        state.orders.insert(order.id.clone(), order.clone());
        state.open_orders.push(order.clone());
        state.submitted.push(order.clone());
        Ok(order)
    }
}
