// Order tracking, reinvestment and the trading loop
pub mod order_tracker;
pub mod prompt;
pub mod reinvest;
pub mod report;
pub mod trader;

pub use order_tracker::OrderTracker;
pub use prompt::{FixedSide, SidePrompt, TerminalPrompt};
pub use reinvest::{calculate_reinvestment, reinvest, Reinvestment, TRADE_FEE};
pub use report::OrderSummary;
pub use trader::{AutoTrader, StepOutcome, TraderState};
