use super::{ContrailStats, EmissionResult, SpeciesEmissions};
use crate::config::{AircraftProfile, AircraftType, CoreConfig};
use crate::matching::FlightTrack;
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

/// Rejections of the emission model. All of them are fatal for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum EmissionError {
    /// The designator is not a known airframe, or it is not configured.
    UnknownAircraft(String),
    /// Distance is negative, zero or not finite.
    InvalidDistance(f64),
    /// Contrail statistics are inconsistent (more pixels than the scene, intensity outside `[0, 1]`).
    InvalidContrail,
    /// An altitude-aware evaluation was requested outside the cruise band.
    AltitudeOutOfBand(u32),
}

impl Display for EmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EmissionError::UnknownAircraft(a) => write!(f, "unknown aircraft type {a}"),
            EmissionError::InvalidDistance(d) => write!(f, "invalid flight distance {d} km"),
            EmissionError::InvalidContrail => write!(f, "inconsistent contrail statistics"),
            EmissionError::AltitudeOutOfBand(a) => write!(f, "altitude {a} m is outside the cruise band"),
        }
    }
}

impl std::error::Error for EmissionError {}

/// Pure emission calculator over the shared reference tables.
///
/// ```text
/// fuel_burn    = distance * fuel_factor(aircraft)
/// co2_direct   = fuel_burn * combustion_factor
/// co2_contrail = pixels * ground_sample_area * intensity * co2_eq_per_km2
/// co2_total    = co2_direct + co2_contrail
/// ```
#[derive(Debug, Clone)]
pub struct EmissionModel {
    config: Arc<CoreConfig>,
}

impl EmissionModel {
    pub fn new(config: Arc<CoreConfig>) -> Self { Self { config } }

    pub fn config(&self) -> &CoreConfig { &self.config }

    /// Resolves a reported designator to a configured airframe.
    ///
    /// # Errors
    /// [`EmissionError::UnknownAircraft`] naming the offending designator.
    pub fn resolve_aircraft(&self, designator: &str) -> Result<AircraftType, EmissionError> {
        let aircraft = designator.parse::<AircraftType>().map_err(EmissionError::UnknownAircraft)?;
        self.profile(aircraft)?;
        Ok(aircraft)
    }

    fn profile(&self, aircraft: AircraftType) -> Result<&AircraftProfile, EmissionError> {
        self.config
            .aircraft_profile(aircraft)
            .ok_or_else(|| EmissionError::UnknownAircraft(aircraft.designator().to_string()))
    }

    /// Evaluates one flight with the bare cruise fuel factor.
    ///
    /// # Arguments
    /// * `flight_id` - Identifier carried into the result.
    /// * `distance_km` - Flown great-circle distance, strictly positive.
    /// * `aircraft` - Reported designator, resolved via [`EmissionModel::resolve_aircraft`].
    /// * `contrail` - Statistics of the contrail mask attributed to the flight.
    ///
    /// # Errors
    /// [`EmissionError`] for unknown aircraft, invalid distance or inconsistent contrail data.
    pub fn evaluate(
        &self,
        flight_id: impl Into<String>,
        distance_km: f64,
        aircraft: &str,
        contrail: ContrailStats,
    ) -> Result<EmissionResult, EmissionError> {
        if !(distance_km.is_finite() && distance_km > 0.0) {
            return Err(EmissionError::InvalidDistance(distance_km));
        }
        if !Self::is_consistent(&contrail) {
            return Err(EmissionError::InvalidContrail);
        }
        let aircraft = self.resolve_aircraft(aircraft)?;
        let profile = self.profile(aircraft)?;
        Ok(self.compute(flight_id.into(), profile, distance_km, profile.fuel_burn_cruise(), contrail, None, None))
    }

    /// Evaluates a recorded track: callsign, great-circle length and reported type.
    ///
    /// The contrail statistics are taken to be observed at the track's mean altitude, which
    /// anchors later altitude-aware re-evaluation.
    ///
    /// # Errors
    /// See [`EmissionModel::evaluate`].
    pub fn evaluate_track(&self, track: &FlightTrack, contrail: ContrailStats) -> Result<EmissionResult, EmissionError> {
        let mut result = self.evaluate(track.callsign(), track.distance_km(), track.aircraft_type(), contrail)?;
        result.observed_altitude_m = track.cruise_altitude_m();
        Ok(result)
    }

    /// Re-evaluates `base` as if flown at `altitude_m`.
    ///
    /// Fuel burn and contrail coverage are rescaled by the ratio of the altitude efficiency
    /// factors and of the propensity multipliers between `altitude_m` and the altitude the
    /// contrail was observed at, so evaluating at the observed altitude reproduces `base`.
    /// Without an observed altitude the absolute factors apply. Coverage is capped at the
    /// scene size; intensity and distance are kept.
    ///
    /// # Errors
    /// [`EmissionError::AltitudeOutOfBand`] outside the cruise band,
    /// [`EmissionError::InvalidDistance`] for a deserialized `base` without a positive distance, or
    /// [`EmissionError::UnknownAircraft`] if the airframe is no longer configured.
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate_at_altitude(&self, base: &EmissionResult, altitude_m: u32) -> Result<EmissionResult, EmissionError> {
        if !self.config.cruise_band.contains(altitude_m) {
            return Err(EmissionError::AltitudeOutOfBand(altitude_m));
        }
        if !(base.distance_km.is_finite() && base.distance_km > 0.0) {
            return Err(EmissionError::InvalidDistance(base.distance_km));
        }
        let profile = self.profile(base.aircraft)?;
        let (fuel_ref, propensity_ref) = base.observed_altitude_m.map_or((1.0, 1.0), |obs| {
            (self.config.fuel_altitude.factor(obs), self.config.propensity.multiplier(obs))
        });
        let base_fuel_per_km = base.fuel_burn_kg / base.distance_km;
        let fuel_factor = base_fuel_per_km * self.config.fuel_altitude.factor(altitude_m) / fuel_ref;
        let observed = base.contrail;
        let contrail = ContrailStats {
            pixel_count: (observed.pixel_count * self.config.propensity.multiplier(altitude_m) / propensity_ref)
                .min(observed.total_pixels as f64),
            ..observed
        };
        Ok(self.compute(
            base.flight_id.clone(),
            profile,
            base.distance_km,
            fuel_factor,
            contrail,
            Some(altitude_m),
            Some(altitude_m),
        ))
    }

    #[allow(clippy::cast_precision_loss)]
    fn is_consistent(contrail: &ContrailStats) -> bool {
        contrail.pixel_count.is_finite()
            && contrail.pixel_count >= 0.0
            && contrail.pixel_count <= contrail.total_pixels as f64
            && (0.0..=1.0).contains(&contrail.intensity)
    }

    #[allow(clippy::too_many_arguments)]
    fn compute(
        &self,
        flight_id: String,
        profile: &AircraftProfile,
        distance_km: f64,
        fuel_factor: f64,
        contrail: ContrailStats,
        altitude_m: Option<u32>,
        observed_altitude_m: Option<u32>,
    ) -> EmissionResult {
        let fuel_burn_kg = distance_km * fuel_factor;
        let co2_direct_kg = fuel_burn_kg * self.config.combustion_factor;
        let contrail_area_km2 = contrail.pixel_count * self.config.ground_sample_area_km2;
        let co2_contrail_kg =
            contrail_area_km2 * contrail.intensity * self.config.contrail_forcing.co2_eq_per_km2();
        EmissionResult {
            flight_id,
            aircraft: profile.aircraft(),
            altitude_m,
            observed_altitude_m,
            distance_km,
            fuel_burn_kg,
            co2_direct_kg,
            contrail,
            contrail_area_km2,
            co2_contrail_kg,
            co2_total_kg: co2_direct_kg + co2_contrail_kg,
            species: SpeciesEmissions {
                nox_kg: fuel_burn_kg * profile.ef_nox(),
                h2o_kg: fuel_burn_kg * profile.ef_h2o(),
                soot_kg: fuel_burn_kg * profile.ef_soot(),
            },
        }
    }
}
