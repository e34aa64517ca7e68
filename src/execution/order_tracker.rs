use rust_decimal::Decimal;

use crate::models::{Order, Side};

/// Append-only record of the orders this process knows about, oldest first
#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    orders: Vec<Order>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker seeded with already-known orders (e.g. open at startup)
    pub fn with_orders(orders: Vec<Order>) -> Self {
        if !orders.is_empty() {
            tracing::info!("Tracking {} existing orders", orders.len());
        }
        Self { orders }
    }

    pub fn record(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Most recent order, optionally restricted to one side
    pub fn last(&self, side: Option<Side>) -> Option<&Order> {
        self.orders
            .iter()
            .rev()
            .find(|o| side.map_or(true, |s| o.side == s))
    }

    /// Price of the most recent order on `side`, zero if there is none
    pub fn last_price(&self, side: Side) -> Decimal {
        self.last(Some(side)).map(|o| o.price).unwrap_or(Decimal::ZERO)
    }

    pub fn all_orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(id: &str, side: Side, price: Decimal) -> Order {
        Order {
            id: id.to_string(),
            side,
            price,
            quantity: dec!(1),
        }
    }

    #[test]
    fn test_empty_tracker() {
        let tracker = OrderTracker::new();

        assert!(tracker.is_empty());
        assert!(tracker.last(None).is_none());
        assert!(tracker.last(Some(Side::Buy)).is_none());
        assert_eq!(tracker.last_price(Side::Sell), Decimal::ZERO);
    }

    #[test]
    fn test_last_scans_newest_first() {
        let mut tracker = OrderTracker::new();
        tracker.record(order("a", Side::Buy, dec!(1)));
        tracker.record(order("b", Side::Sell, dec!(2)));
        tracker.record(order("c", Side::Buy, dec!(3)));

        assert_eq!(tracker.last(Some(Side::Buy)).unwrap().id, "c");
        assert_eq!(tracker.last(Some(Side::Sell)).unwrap().id, "b");
        assert_eq!(tracker.last(None).unwrap().id, "c");
        assert_eq!(tracker.last_price(Side::Buy), dec!(3));
        assert_eq!(tracker.last_price(Side::Sell), dec!(2));
    }

    #[test]
    fn test_missing_side_has_zero_price() {
        let tracker = OrderTracker::with_orders(vec![order("a", Side::Sell, dec!(0.0035))]);

        assert_eq!(tracker.len(), 1);
        assert!(tracker.last(Some(Side::Buy)).is_none());
        assert_eq!(tracker.last_price(Side::Buy), Decimal::ZERO);
    }

    #[test]
    fn test_record_preserves_submission_order() {
        let mut tracker = OrderTracker::new();
        for (i, side) in [Side::Sell, Side::Buy, Side::Sell].into_iter().enumerate() {
            tracker.record(order(&i.to_string(), side, Decimal::from(i)));
        }

        let ids: Vec<&str> = tracker.all_orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }
}
