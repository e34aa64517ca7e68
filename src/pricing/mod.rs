// Price calculation: trade-history statistics and spread-adjusted limit prices
pub mod moving_average;
pub mod spread;

pub use moving_average::{calculate_max, calculate_mean, market_totals, AveragingMethod, PriceStats};
pub use spread::{markdown_price, markup_price, normalize_spread, round_price, Spread, PRICE_DECIMALS};
