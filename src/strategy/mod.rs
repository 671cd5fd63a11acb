//! Altitude x market grid search for the cheapest emission configuration.

mod altitude_range;
mod optimizer;
mod strategy_grid;


pub use altitude_range::AltitudeRange;
pub use optimizer::{StrategyError, StrategyOptimizer};
pub use strategy_grid::{
    AltitudeChoice, Baseline, GridCell, GridCompleteness, Recommendation, StrategyGrid,
    StrategyOutcome,
};
