//! Fuel-burn, direct CO2 and contrail CO2-equivalent accounting for single flights.

mod emission_model;
mod emission_result;

#[cfg(test)]
mod tests;

pub use emission_model::{EmissionError, EmissionModel};
pub use emission_result::{ContrailStats, EmissionResult, FleetSummary, SpeciesEmissions};
