//! Portfolio analytics over normalized rows

pub mod aggregator;
pub mod history;

pub use aggregator::{aggregate, aggregate_transactions, Aggregation};
pub use history::{build_history, drawdown, max_drawdown, parse_price_history, portfolio_curve};
