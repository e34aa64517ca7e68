use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::auth::Credentials;
use super::{ApiResult, ExchangeApi};
use crate::error::RemoteError;
use crate::models::{Balance, ExchangeOrder, MarketSummary, Side, Ticker, Trade};

// Bittrex REST API v3
// Docs: https://bittrex.github.io/api/v3
const BITTREX_API_BASE: &str = "https://api.bittrex.com/v3";
const RATE_LIMIT_RPM: NonZeroU32 = match NonZeroU32::new(60) {
    Some(n) => n,
    None => panic!("rate limit must be non-zero"),
};
const REQUEST_TIMEOUT_SECS: u64 = 30;

type BittrexRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Bounded retry for transport failures (connection refused, timeouts)
///
/// Error responses from the exchange are never retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            wait: Duration::from_secs(5),
        }
    }
}

/// Signed client for the Bittrex exchange
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct BittrexClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    retry: RetryPolicy,
    rate_limiter: Arc<BittrexRateLimiter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewLimitOrder<'a> {
    market_symbol: &'a str,
    direction: Side,
    #[serde(rename = "type")]
    order_type: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    limit: Decimal,
    time_in_force: &'static str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
}

impl BittrexClient {
    pub fn new(credentials: Credentials) -> ApiResult<Self> {
        Self::with_base_url(credentials, BITTREX_API_BASE)
    }

    /// Client against another endpoint (e.g. a local mock server)
    pub fn with_base_url(credentials: Credentials, base_url: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            retry: RetryPolicy::default(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(RATE_LIMIT_RPM))),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Cancel an open order
    /// Endpoint: DELETE /orders/{id}
    pub async fn cancel_order(&self, id: &str) -> ApiResult<ExchangeOrder> {
        self.send(Method::DELETE, &format!("orders/{}", id), &[], None, true)
            .await
    }

    /// Endpoint: GET /balances/{currency}
    pub async fn get_balance(&self, currency: &str) -> ApiResult<Balance> {
        self.send(Method::GET, &format!("balances/{}", currency), &[], None, true)
            .await
    }

    /// Recently closed orders on a market
    /// Endpoint: GET /orders/closed?marketSymbol={market}
    pub async fn get_closed_orders(&self, market: &str) -> ApiResult<Vec<ExchangeOrder>> {
        self.send(
            Method::GET,
            "orders/closed",
            &[("marketSymbol", market)],
            None,
            true,
        )
        .await
    }

    /// Endpoint: GET /markets/{market}/summary
    pub async fn get_market_summary(&self, market: &str) -> ApiResult<MarketSummary> {
        self.send(
            Method::GET,
            &format!("markets/{}/summary", market),
            &[],
            None,
            false,
        )
        .await
    }

    /// Send a request, retrying transport failures per the retry policy
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
        auth: bool,
    ) -> ApiResult<T> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| RemoteError::Request(format!("invalid URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let body = body.unwrap_or_default();

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            self.rate_limiter.until_ready().await;

            let mut request = self.client.request(method.clone(), url.clone());
            if auth {
                // Timestamp is part of the signature, so sign every attempt afresh
                let headers = self.credentials.sign(
                    method.as_str(),
                    url.as_str(),
                    &body,
                    chrono::Utc::now().timestamp_millis(),
                )?;
                for (name, value) in headers {
                    request = request.header(name, value);
                }
            }
            if !body.is_empty() {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }

            match request.send().await {
                Ok(response) => break response,
                Err(e) if attempt < self.retry.max_attempts => {
                    tracing::warn!(
                        "Request to {} failed: {}, retrying in {:?} (attempt {}/{})",
                        path,
                        e,
                        self.retry.wait,
                        attempt,
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(self.retry.wait).await;
                }
                Err(e) => {
                    return Err(RemoteError::Unreachable {
                        attempts: attempt,
                        source: e,
                    })
                }
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Decode(format!("failed to read {} response: {}", path, e)))?;

        if !status.is_success() {
            let code = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.code)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("UNKNOWN")
                        .to_string()
                });
            tracing::error!(status = status.as_u16(), %code, "Bittrex API error on {}", path);
            return Err(RemoteError::Api {
                status: status.as_u16(),
                code,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| RemoteError::Decode(format!("unexpected {} response: {}", path, e)))
    }
}

#[async_trait]
impl ExchangeApi for BittrexClient {
    /// Endpoint: GET /orders/open?marketSymbol={market}
    async fn get_open_orders(&self, market: &str) -> ApiResult<Vec<ExchangeOrder>> {
        self.send(
            Method::GET,
            "orders/open",
            &[("marketSymbol", market)],
            None,
            true,
        )
        .await
    }

    /// Endpoint: GET /orders/{id}
    async fn get_order(&self, id: &str) -> ApiResult<ExchangeOrder> {
        self.send(Method::GET, &format!("orders/{}", id), &[], None, true)
            .await
    }

    /// Endpoint: GET /markets/{market}/ticker
    async fn get_ticker(&self, market: &str) -> ApiResult<Ticker> {
        self.send(
            Method::GET,
            &format!("markets/{}/ticker", market),
            &[],
            None,
            false,
        )
        .await
    }

    /// Endpoint: GET /markets/{market}/trades
    async fn get_recent_trades(&self, market: &str) -> ApiResult<Vec<Trade>> {
        self.send(
            Method::GET,
            &format!("markets/{}/trades", market),
            &[],
            None,
            false,
        )
        .await
    }

    /// Endpoint: POST /orders
    async fn submit_limit_order(
        &self,
        market: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> ApiResult<ExchangeOrder> {
        let order = NewLimitOrder {
            market_symbol: market,
            direction: side,
            order_type: "LIMIT",
            quantity,
            limit: price,
            time_in_force: "GOOD_TIL_CANCELLED",
        };
        let body = serde_json::to_string(&order)
            .map_err(|e| RemoteError::Request(format!("failed to encode order: {}", e)))?;

        tracing::info!(%market, %side, %quantity, %price, "Submitting limit order");

        self.send(Method::POST, "orders", &[], Some(body), true)
            .await
    }
}
