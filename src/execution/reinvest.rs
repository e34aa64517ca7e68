use rust_decimal::{Decimal, RoundingStrategy};

use super::OrderTracker;
use crate::models::Side;
use crate::pricing::PRICE_DECIMALS;

/// Fraction the exchange charges per BUY/SELL trade (0.25%)
pub const TRADE_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 4);

/// Realized earnings from the last SELL/BUY pair and the quantity they buy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reinvestment {
    pub earnings: Decimal,
    pub processed: Decimal,
    pub available: Decimal,
    /// `None` when the proceeds cannot be converted at `last_price`
    pub units: Option<Decimal>,
}

/// Earnings from a profitable BUY/SELL pair, if any
///
/// Requires both a prior SELL and a prior BUY price (zero means absent) and
/// positive earnings. The new quantity is truncated to 8 places and only
/// offered if buying it at `last_price` fits within the available proceeds.
pub fn calculate_reinvestment(
    units: Decimal,
    last_price: Decimal,
    sell_price: Decimal,
    buy_price: Decimal,
    fee: Decimal,
) -> Option<Reinvestment> {
    if sell_price.is_zero() || buy_price.is_zero() {
        return None;
    }

    let earnings = (sell_price - buy_price) * units;
    if earnings <= Decimal::ZERO {
        return None;
    }

    let processed = units * sell_price;
    let available = processed - processed * fee + earnings;

    let new_units = Some(last_price)
        .filter(|price| *price > Decimal::ZERO)
        .map(|price| {
            (available / price).round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::ToZero)
        })
        .filter(|candidate| *candidate * last_price <= available);

    Some(Reinvestment {
        earnings,
        processed,
        available,
        units: new_units,
    })
}

/// Update `units` from the tracker's last SELL/BUY prices
pub fn reinvest(
    units: &mut Decimal,
    last_price: Decimal,
    orders: &OrderTracker,
) -> Option<Reinvestment> {
    let sell_price = orders.last_price(Side::Sell);
    let buy_price = orders.last_price(Side::Buy);

    let reinvestment = calculate_reinvestment(*units, last_price, sell_price, buy_price, TRADE_FEE)?;
    tracing::info!(
        available = %reinvestment.available,
        "Total earnings: {}",
        reinvestment.earnings
    );

    match reinvestment.units {
        Some(new_units) => {
            tracing::info!("Reinvesting: units {} -> {}", units, new_units);
            *units = new_units;
        }
        None => tracing::warn!(%last_price, "Earnings not reinvested, keeping {} units", units),
    }

    Some(reinvestment)
}
