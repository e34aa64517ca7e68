use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::spread::round_price;
use crate::error::TraderError;
use crate::models::{Side, Trade};
use crate::Result;

/// How the average trade price is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AveragingMethod {
    /// Plain arithmetic mean of trade prices
    #[default]
    Arithmetic,
}

impl fmt::Display for AveragingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AveragingMethod::Arithmetic => f.write_str("arithmetic"),
        }
    }
}

impl FromStr for AveragingMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arithmetic" => Ok(AveragingMethod::Arithmetic),
            // No weighting scheme is defined for this yet, so refuse rather than guess
            "weighted" => Err("averaging method 'weighted' is not implemented".to_string()),
            other => Err(format!("unknown averaging method: {}", other)),
        }
    }
}

/// Average and max price of the recent trades on one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub average: Decimal,
    pub max: Decimal,
}

/// Calculate the arithmetic mean
pub fn calculate_mean(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }

    let sum: Decimal = prices.iter().sum();
    Some(sum / Decimal::from(prices.len()))
}

pub fn calculate_max(prices: &[Decimal]) -> Option<Decimal> {
    prices.iter().copied().max()
}

/// Average/max price of recent trades whose taker side matches `side`, rounded to 8 places
///
/// Fails with `DataUnavailable` when no trade on that side exists.
pub fn market_totals(
    market: &str,
    trades: &[Trade],
    side: Side,
    method: AveragingMethod,
) -> Result<PriceStats> {
    let prices: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.taker_side == side)
        .map(|t| t.rate)
        .collect();

    let unavailable = || TraderError::DataUnavailable {
        market: market.to_string(),
        side,
    };

    let average = match method {
        AveragingMethod::Arithmetic => calculate_mean(&prices).ok_or_else(unavailable)?,
    };
    let max = calculate_max(&prices).ok_or_else(unavailable)?;

    Ok(PriceStats {
        average: round_price(average),
        max: round_price(max),
    })
}
