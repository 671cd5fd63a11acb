use crate::config::AircraftType;
use crate::segmentation::MaskStats;
use serde::{Deserialize, Serialize};

/// Contrail statistics an emission evaluation consumes.
///
/// `pixel_count` is fractional because altitude-aware evaluation rescales observed coverage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrailStats {
    pub pixel_count: f64,
    pub total_pixels: usize,
    /// Mean detection probability of the contrail pixels, `[0, 1]`.
    pub intensity: f64,
}

impl ContrailStats {
    /// Statistics of a scene without detected contrails.
    pub fn none(total_pixels: usize) -> Self {
        Self { pixel_count: 0.0, total_pixels, intensity: 0.0 }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_fraction(&self) -> f64 {
        if self.total_pixels == 0 { 0.0 } else { self.pixel_count / self.total_pixels as f64 }
    }
}

impl From<MaskStats> for ContrailStats {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: MaskStats) -> Self {
        Self {
            pixel_count: value.pixel_count as f64,
            total_pixels: value.total_pixels,
            intensity: value.intensity,
        }
    }
}

/// Non-CO2 combustion products in kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEmissions {
    pub nox_kg: f64,
    pub h2o_kg: f64,
    pub soot_kg: f64,
}

/// Emissions of one flight evaluated at one altitude. All masses in kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    /// Flight identifier (callsign).
    pub(super) flight_id: String,
    pub(super) aircraft: AircraftType,
    /// Evaluation altitude, `None` for the altitude-agnostic base evaluation.
    pub(super) altitude_m: Option<u32>,
    /// Altitude the contrail statistics describe, if known.
    pub(super) observed_altitude_m: Option<u32>,
    pub(super) distance_km: f64,
    pub(super) fuel_burn_kg: f64,
    pub(super) co2_direct_kg: f64,
    /// Contrail statistics the contrail term was derived from.
    pub(super) contrail: ContrailStats,
    pub(super) contrail_area_km2: f64,
    pub(super) co2_contrail_kg: f64,
    pub(super) co2_total_kg: f64,
    pub(super) species: SpeciesEmissions,
}

impl EmissionResult {
    pub fn flight_id(&self) -> &str { &self.flight_id }
    pub fn aircraft(&self) -> AircraftType { self.aircraft }
    pub fn altitude_m(&self) -> Option<u32> { self.altitude_m }
    pub fn observed_altitude_m(&self) -> Option<u32> { self.observed_altitude_m }
    pub fn distance_km(&self) -> f64 { self.distance_km }
    pub fn fuel_burn_kg(&self) -> f64 { self.fuel_burn_kg }
    pub fn co2_direct_kg(&self) -> f64 { self.co2_direct_kg }
    pub fn contrail(&self) -> ContrailStats { self.contrail }
    pub fn contrail_area_km2(&self) -> f64 { self.contrail_area_km2 }
    pub fn contrail_intensity(&self) -> f64 { self.contrail.intensity }
    pub fn co2_contrail_kg(&self) -> f64 { self.co2_contrail_kg }
    pub fn co2_total_kg(&self) -> f64 { self.co2_total_kg }
    pub fn species(&self) -> SpeciesEmissions { self.species }

    /// Total CO2-equivalent per flown kilometre.
    pub fn emission_factor(&self) -> f64 { self.co2_total_kg / self.distance_km }

    /// Share of the total attributable to contrails, `[0, 1]`.
    pub fn contrail_share(&self) -> f64 {
        if self.co2_total_kg > 0.0 { self.co2_contrail_kg / self.co2_total_kg } else { 0.0 }
    }
}

/// Aggregate over several evaluated flights, e.g. one airline's daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub flights: usize,
    pub distance_km: f64,
    pub fuel_burn_kg: f64,
    pub co2_direct_kg: f64,
    pub co2_contrail_kg: f64,
    pub co2_total_kg: f64,
}

impl FleetSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a EmissionResult>) -> Self {
        results.into_iter().fold(
            Self {
                flights: 0,
                distance_km: 0.0,
                fuel_burn_kg: 0.0,
                co2_direct_kg: 0.0,
                co2_contrail_kg: 0.0,
                co2_total_kg: 0.0,
            },
            |acc, r| Self {
                flights: acc.flights + 1,
                distance_km: acc.distance_km + r.distance_km,
                fuel_burn_kg: acc.fuel_burn_kg + r.fuel_burn_kg,
                co2_direct_kg: acc.co2_direct_kg + r.co2_direct_kg,
                co2_contrail_kg: acc.co2_contrail_kg + r.co2_contrail_kg,
                co2_total_kg: acc.co2_total_kg + r.co2_total_kg,
            },
        )
    }

    /// Fleet-wide kg CO2-equivalent per km, `None` without flown distance.
    pub fn mean_emission_factor(&self) -> Option<f64> {
        (self.distance_km > 0.0).then(|| self.co2_total_kg / self.distance_km)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean_co2_per_flight(&self) -> Option<f64> {
        (self.flights > 0).then(|| self.co2_total_kg / self.flights as f64)
    }
}
