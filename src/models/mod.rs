use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order direction, also used as the taker side of historical trades
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The other side (BUY <-> SELL)
    pub fn flip(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown order side: {}", other)),
        }
    }
}

/// An order this process submitted (or found open at startup)
///
/// Never mutated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Open,
    Closed,
}

/// Order as reported by the exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOrder {
    pub id: String,
    pub market_symbol: String,
    pub direction: Side,
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub limit: Option<Decimal>,
    #[serde(default)]
    pub fill_quantity: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExchangeOrder {
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Closed without anything executed: the order was cancelled, not filled.
    pub fn was_cancelled(&self) -> bool {
        self.status == OrderStatus::Closed && self.fill_quantity.is_zero()
    }

    pub fn is_limit(&self) -> bool {
        self.order_type.eq_ignore_ascii_case("LIMIT")
    }

    /// Local record of this order. Orders without a limit price are recorded at zero.
    pub fn to_order(&self) -> Order {
        Order {
            id: self.id.clone(),
            side: self.direction,
            price: self.limit.unwrap_or_default(),
            quantity: self.quantity,
        }
    }
}

/// Best bid/ask and last trade for a market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_trade_rate: Decimal,
    pub bid_rate: Decimal,
    pub ask_rate: Decimal,
}

/// Historical trade executed on the market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub executed_at: DateTime<Utc>,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub taker_side: Side,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency_symbol: String,
    pub total: Decimal,
    pub available: Decimal,
}

/// Last 24 hour summary of a market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub symbol: String,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub quote_volume: Decimal,
    #[serde(default)]
    pub percent_change: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}
