//! Reference data and numeric constants of the analysis core.
//!
//! Everything here is loaded once, validated, and shared read-only afterwards.

mod aircraft;
mod altitude;
mod core_config;
mod market;

#[cfg(test)]
mod tests;

pub use aircraft::{AircraftProfile, AircraftType};
pub use altitude::{ContrailPropensityCurve, CruiseBand, FuelAltitudeBands};
pub use core_config::{ConfigError, ContrailForcing, CoreConfig};
pub use market::{MarketId, MarketProfile};
