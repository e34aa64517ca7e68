use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

use crate::models::{Order, Side};
use crate::pricing::PriceStats;

/// What one submission decided, for the operator
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub market: String,
    pub order: Order,
    pub stats: PriceStats,
    /// Ticker bid for a BUY, ask for a SELL
    pub ticker_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl OrderSummary {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let ticker_label = match self.order.side {
            Side::Buy => "Bid",
            Side::Sell => "Ask",
        };

        vec![
            ("Avg", format!("{:.8}", self.stats.average)),
            ("Max", format!("{:.8}", self.stats.max)),
            (ticker_label, format!("{:.8}", self.ticker_price)),
            ("Limit", format!("{:.8}", self.order.price)),
            ("Qty", format!("{:.8}", self.order.quantity)),
        ]
    }
}

impl fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "BTC-LTC" shows as "LTC"
        let currency = self
            .market
            .strip_prefix("BTC-")
            .unwrap_or(&self.market);

        writeln!(f, "{:<6} {}", self.order.side.as_str(), currency)?;
        writeln!(f, "{}", "─".repeat(23))?;
        for (label, value) in self.rows() {
            writeln!(f, "{:<6} {:>16}", label, value)?;
        }
        write!(f, "{}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))
    }
}
