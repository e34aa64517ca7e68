use rust_decimal::Decimal;
use std::str::FromStr;

/// Limit prices are always expressed with this many decimal places
pub const PRICE_DECIMALS: u32 = 8;

/// Round to 8 decimal places (banker's rounding)
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp(PRICE_DECIMALS)
}

/// Values below 1 are already fractions; anything else is a percentage.
pub fn normalize_spread(value: Decimal) -> Decimal {
    if value < Decimal::ONE {
        value
    } else {
        value / Decimal::ONE_HUNDRED
    }
}

/// SELL limit: ask marked up by `markup`
pub fn markup_price(ask: Decimal, markup: Decimal) -> Decimal {
    round_price(ask + ask * markup)
}

/// BUY limit: bid marked down by `markdown`
pub fn markdown_price(bid: Decimal, markdown: Decimal) -> Decimal {
    round_price(bid - bid * markdown)
}

/// Markup (SELL) / markdown (BUY) fractions, parsed from "markup/markdown"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub markup: Decimal,
    pub markdown: Decimal,
}

impl Spread {
    pub fn new(markup: Decimal, markdown: Decimal) -> Self {
        Self {
            markup: normalize_spread(markup),
            markdown: normalize_spread(markdown),
        }
    }
}

impl Default for Spread {
    fn default() -> Self {
        // 0.1/0.1
        Self::new(Decimal::new(1, 1), Decimal::new(1, 1))
    }
}

impl FromStr for Spread {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').map(str::trim).collect();
        let [markup, markdown] = parts.as_slice() else {
            return Err(format!("spread must be 'markup/markdown', got '{}'", s));
        };

        let parse = |raw: &str| -> Result<Decimal, String> {
            let value = Decimal::from_str(raw)
                .map_err(|e| format!("invalid spread value '{}': {}", raw, e))?;
            if value.is_sign_negative() {
                return Err(format!("spread value must not be negative, got {}", raw));
            }
            Ok(value)
        };

        let spread = Spread::new(parse(*markup)?, parse(*markdown)?);
        // A full markdown would price BUY orders at or below zero
        if spread.markdown >= Decimal::ONE {
            return Err(format!("markdown must be below 100%, got '{}'", markdown));
        }
        Ok(spread)
    }
}
