pub mod auth;
pub mod bittrex;

pub use auth::Credentials;
pub use bittrex::{BittrexClient, RetryPolicy};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::RemoteError;
use crate::models::{ExchangeOrder, Side, Ticker, Trade};

pub type ApiResult<T> = std::result::Result<T, RemoteError>;

/// Exchange operations the trading loop depends on
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Orders currently open on `market`
    async fn get_open_orders(&self, market: &str) -> ApiResult<Vec<ExchangeOrder>>;

    async fn get_order(&self, id: &str) -> ApiResult<ExchangeOrder>;

    async fn get_ticker(&self, market: &str) -> ApiResult<Ticker>;

    /// Latest trades executed on `market`
    async fn get_recent_trades(&self, market: &str) -> ApiResult<Vec<Trade>>;

    /// Place a good-til-cancelled limit order
    async fn submit_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> ApiResult<ExchangeOrder>;
}
