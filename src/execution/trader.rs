use chrono::Utc;
use rust_decimal::Decimal;
use std::io;
use std::time::Duration;

use super::prompt::{FixedSide, SidePrompt};
use super::reinvest::reinvest;
use super::report::OrderSummary;
use super::OrderTracker;
use crate::api::ExchangeApi;
use crate::config::TraderConfig;
use crate::models::{Order, Side};
use crate::pricing::{markdown_price, market_totals, markup_price, AveragingMethod, Spread};
use crate::Result;

/// Mutable trading state, owned by the loop
#[derive(Debug, Clone)]
pub struct TraderState {
    pub market: String,
    pub units: Decimal,
    pub spread: Spread,
    pub method: AveragingMethod,
    pub next_side: Side,
    pub orders: OrderTracker,
}

/// Result of one loop iteration
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The last order is still open; nothing was submitted
    Waiting { order_id: String },
    Submitted(OrderSummary),
}

/// Alternating BUY/SELL limit order loop for a single market
pub struct AutoTrader<E: ExchangeApi> {
    exchange: E,
    prompt: Box<dyn SidePrompt>,
    interactive: bool,
    delay: Duration,
    state: TraderState,
    /// Closed order whose outcome has already been acted on
    settled_order: Option<String>,
}

impl<E: ExchangeApi> AutoTrader<E> {
    pub fn new(config: &TraderConfig, exchange: E, prompt: Box<dyn SidePrompt>) -> Self {
        Self {
            exchange,
            prompt,
            interactive: config.prompt,
            delay: config.delay,
            state: TraderState {
                market: config.market.clone(),
                units: config.units,
                spread: config.spread,
                method: config.method,
                next_side: Side::Sell,
                orders: OrderTracker::new(),
            },
            settled_order: None,
        }
    }

    pub fn state(&self) -> &TraderState {
        &self.state
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Load open orders and decide which side to trade first
    pub async fn initialize(&mut self) -> Result<Side> {
        let open_orders = self.exchange.get_open_orders(&self.state.market).await?;
        let last_was_sell_limit = open_orders
            .last()
            .is_some_and(|o| o.is_limit() && o.direction == Side::Sell);

        self.state.orders = OrderTracker::with_orders(
            open_orders.iter().map(|o| o.to_order()).collect(),
        );
        self.settled_order = None;

        let next_side = if self.state.orders.is_empty() && self.interactive {
            self.ask_start_side().await?
        } else if last_was_sell_limit {
            Side::Buy
        } else {
            Side::Sell
        };
        self.state.next_side = next_side;

        tracing::info!(
            market = %self.state.market,
            open_orders = open_orders.len(),
            "Starting with {}",
            next_side
        );
        Ok(next_side)
    }

    /// Run the prompt on the blocking pool so terminal reads never stall the runtime
    async fn ask_start_side(&mut self) -> Result<Side> {
        let mut prompt = std::mem::replace(&mut self.prompt, Box::new(FixedSide(Side::Sell)));
        let (prompt, side) = tokio::task::spawn_blocking(move || {
            let side = prompt.choose_start_side();
            (prompt, side)
        })
        .await
        .map_err(io::Error::other)?;

        self.prompt = prompt;
        Ok(side?)
    }

    /// One iteration: wait on the last order if it is open, otherwise submit the next side
    pub async fn step(&mut self) -> Result<StepOutcome> {
        if let Some(last) = self.state.orders.last(None) {
            let order_id = last.id.clone();

            if self.settled_order.as_deref() != Some(order_id.as_str()) {
                let order = self.exchange.get_order(&order_id).await?;

                if order.is_open() {
                    tracing::debug!(%order_id, "Order in progress, waiting {:?}", self.delay);
                    tokio::time::sleep(self.delay).await;
                    return Ok(StepOutcome::Waiting { order_id });
                }

                // Cancelled remotely: resubmit the same side at a fresh price
                if order.was_cancelled() {
                    self.state.next_side = self.state.next_side.flip();
                    tracing::warn!(%order_id, "Order remotely cancelled");
                }
                self.settled_order = Some(order_id);
            }
        }

        let summary = self.submit_order(self.state.next_side).await?;
        self.state.next_side = self.state.next_side.flip();

        Ok(StepOutcome::Submitted(summary))
    }

    /// Trade until a fatal error; missing trade data waits and retries
    pub async fn run(&mut self) -> Result<()> {
        self.initialize().await?;

        loop {
            match self.step().await {
                Ok(StepOutcome::Submitted(summary)) => println!("{}\n", summary),
                Ok(StepOutcome::Waiting { .. }) => {}
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("{}, retrying in {:?}", e, self.delay);
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Price and submit a limit order on `side`, recording it
    async fn submit_order(&mut self, side: Side) -> Result<OrderSummary> {
        let market = self.state.market.clone();
        tracing::info!(%market, %side, "Creating new order");

        let trades = self.exchange.get_recent_trades(&market).await?;
        let stats = market_totals(&market, &trades, side, self.state.method)?;

        let ticker = self.exchange.get_ticker(&market).await?;

        let (ticker_price, price) = match side {
            Side::Buy => {
                reinvest(&mut self.state.units, ticker.last_trade_rate, &self.state.orders);
                (
                    ticker.bid_rate,
                    markdown_price(ticker.bid_rate, self.state.spread.markdown),
                )
            }
            Side::Sell => (
                ticker.ask_rate,
                markup_price(ticker.ask_rate, self.state.spread.markup),
            ),
        };

        let quantity = self.state.units;
        let placed = self
            .exchange
            .submit_limit_order(&market, side, quantity, price)
            .await?;

        let order = Order {
            id: placed.id,
            side,
            price,
            quantity,
        };
        self.state.orders.record(order.clone());

        tracing::info!(
            order_id = %order.id,
            %side,
            %price,
            %quantity,
            average = %stats.average,
            max = %stats.max,
            "Order submitted"
        );

        Ok(OrderSummary {
            market,
            order,
            stats,
            ticker_price,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::prompt::TerminalPrompt;
    use std::io::Cursor;
    use crate::test_support::{test_config, MockExchange};
    use rust_decimal_macros::dec;

    fn trader(exchange: &MockExchange, prompt: bool) -> AutoTrader<MockExchange> {
        let mut config = test_config();
        config.prompt = prompt;
        AutoTrader::new(&config, exchange.clone(), Box::new(FixedSide(Side::Buy)))
    }

    fn submitted(outcome: StepOutcome) -> OrderSummary {
        match outcome {
            StepOutcome::Submitted(summary) => summary,
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_defaults_to_sell_without_prompt() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);

        assert_eq!(trader.initialize().await.unwrap(), Side::Sell);
    }

    #[tokio::test]
    async fn test_prompt_chooses_start_side() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, true);

        assert_eq!(trader.initialize().await.unwrap(), Side::Buy);
    }

    #[tokio::test]
    async fn test_terminal_prompt_is_kept_across_initializations() {
        let exchange = MockExchange::with_market_data();
        let mut config = test_config();
        config.prompt = true;
        let prompt = TerminalPrompt::new(Cursor::new(b"1\n2\n".to_vec()), Vec::new());
        let mut trader = AutoTrader::new(&config, exchange.clone(), Box::new(prompt));

        assert_eq!(trader.initialize().await.unwrap(), Side::Buy);
        // Second answer comes from the same reader
        assert_eq!(trader.initialize().await.unwrap(), Side::Sell);
    }

    #[tokio::test]
    async fn test_open_sell_continues_with_buy() {
        let exchange = MockExchange::with_market_data();
        let open_id = exchange.add_open_order(Side::Sell, dec!(1), dec!(0.0039));
        let mut trader = trader(&exchange, true);

        // Prompt is skipped when orders are already open
        assert_eq!(trader.initialize().await.unwrap(), Side::Buy);
        assert_eq!(trader.state().orders.last(None).unwrap().id, open_id);
    }

    #[tokio::test]
    async fn test_waits_while_order_open() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        let first = submitted(trader.step().await.unwrap());
        assert_eq!(first.order.side, Side::Sell);

        let outcome = trader.step().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Waiting {
                order_id: first.order.id.clone()
            }
        );
        assert_eq!(trader.state().next_side, Side::Buy);
        assert_eq!(exchange.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_sell_price_is_marked_up() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        let summary = submitted(trader.step().await.unwrap());

        // ask 0.0035 + 10%
        assert_eq!(summary.order.price, dec!(0.00385));
        assert_eq!(summary.ticker_price, dec!(0.0035));
        assert_eq!(summary.stats.average, dec!(0.0036));
        assert_eq!(summary.stats.max, dec!(0.0037));
        assert_eq!(summary.order.quantity, dec!(1));
    }

    #[tokio::test]
    async fn test_buy_price_is_marked_down() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        let sell = submitted(trader.step().await.unwrap());
        exchange.fill(&sell.order.id);
        let buy = submitted(trader.step().await.unwrap());

        // bid 0.0034 - 10%
        assert_eq!(buy.order.side, Side::Buy);
        assert_eq!(buy.order.price, dec!(0.00306));
        assert_eq!(buy.stats.average, dec!(0.0033));
    }

    #[tokio::test]
    async fn test_cancelled_order_is_resubmitted_on_same_side() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        let sell = submitted(trader.step().await.unwrap());
        exchange.cancel(&sell.order.id);

        let retry = submitted(trader.step().await.unwrap());
        assert_eq!(retry.order.side, Side::Sell);
        assert_eq!(trader.state().next_side, Side::Buy);
    }

    #[tokio::test]
    async fn test_missing_trades_do_not_flip_twice() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        let sell = submitted(trader.step().await.unwrap());
        exchange.cancel(&sell.order.id);
        let trades = exchange.take_trades();

        let err = trader.step().await.unwrap_err();
        assert!(!err.is_fatal());

        // Retrying after data returns must not apply the cancellation flip again
        exchange.set_trades(trades);
        let retry = submitted(trader.step().await.unwrap());
        assert_eq!(retry.order.side, Side::Sell);
    }

    #[tokio::test]
    async fn test_remote_error_is_fatal() {
        let exchange = MockExchange::with_market_data();
        let mut trader = trader(&exchange, false);
        trader.initialize().await.unwrap();

        exchange.fail_next("INSUFFICIENT_FUNDS");
        let err = trader.step().await.unwrap_err();

        assert!(err.is_fatal());
        assert!(trader.state().orders.is_empty());
        assert_eq!(trader.state().next_side, Side::Sell);
    }
}
