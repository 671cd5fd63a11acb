//! Carbon-market pricing of CO2-equivalent totals.

mod compliance;
mod market_engine;

#[cfg(test)]
mod tests;

pub use compliance::{AnnualCompliance, CostForecast, PurchasePlan};
pub use market_engine::{CarbonMarketEngine, MarketComparison, MarketError, MarketQuote};
