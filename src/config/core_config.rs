use super::{
    AircraftProfile, AircraftType, ContrailPropensityCurve, CruiseBand, FuelAltitudeBands,
    MarketId, MarketProfile,
};
use crate::log;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    env,
    fmt::{Display, Formatter},
    str::FromStr,
};
use strum::IntoEnumIterator;

/// Radiative-forcing constants used to turn contrail area into a CO2 equivalent.
///
/// `co2_eq_kg = area_km2 * 1e6 * intensity * rf_base_w_m2 * duration_h / 1000
///              * kwh_to_co2_kg * gwp_multiplier`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrailForcing {
    /// Baseline contrail radiative forcing in W/m².
    pub rf_base_w_m2: f64,
    /// Mean contrail lifetime in hours.
    pub duration_h: f64,
    /// kg CO2-equivalent per kWh of forcing energy.
    pub kwh_to_co2_kg: f64,
    /// Warming-potential multiplier of contrail cirrus relative to CO2.
    pub gwp_multiplier: f64,
}

impl ContrailForcing {
    /// kg CO2-equivalent per km² of contrail at full intensity.
    pub fn co2_eq_per_km2(&self) -> f64 {
        const M2_PER_KM2: f64 = 1e6;
        const WH_PER_KWH: f64 = 1000.0;
        M2_PER_KM2 * self.rf_base_w_m2 * self.duration_h / WH_PER_KWH
            * self.kwh_to_co2_kg
            * self.gwp_multiplier
    }

    fn is_plausible(&self) -> bool {
        [self.rf_base_w_m2, self.duration_h, self.kwh_to_co2_kg, self.gwp_multiplier]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Default for ContrailForcing {
    fn default() -> Self {
        Self { rf_base_w_m2: 0.03, duration_h: 3.0, kwh_to_co2_kg: 0.5, gwp_multiplier: 2.5 }
    }
}

/// Everything that can be wrong with a [`CoreConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A scalar constant is negative, zero where it must be positive, or not finite.
    InvalidConstant(&'static str),
    /// The cruise band is empty or inverted.
    InvalidCruiseBand,
    /// The altitude->coverage curve is empty, unordered or decreasing.
    NonMonotonePropensity,
    /// An aircraft record carries implausible factors.
    InvalidAircraft(AircraftType),
    /// A market record carries an implausible price.
    InvalidMarket(MarketId),
    /// A market is listed more than once.
    DuplicateMarket(MarketId),
    /// An environment override could not be parsed.
    InvalidEnv(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidConstant(name) => write!(f, "invalid constant `{name}`"),
            ConfigError::InvalidCruiseBand => write!(f, "cruise band is empty or inverted"),
            ConfigError::NonMonotonePropensity => {
                write!(f, "altitude->contrail propensity curve is not monotone")
            }
            ConfigError::InvalidAircraft(a) => write!(f, "implausible aircraft record {}", a.designator()),
            ConfigError::InvalidMarket(m) => write!(f, "implausible market record {m}"),
            ConfigError::DuplicateMarket(m) => write!(f, "market {m} configured twice"),
            ConfigError::InvalidEnv(var) => write!(f, "cannot parse environment variable {var}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// All numeric constants and reference tables of the analysis core.
///
/// Built once (defaults, environment overrides), validated, then shared read-only
/// across concurrent analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Ground area covered by one imagery pixel (2 km x 2 km for GOES-16 ABI IR bands).
    pub ground_sample_area_km2: f64,
    /// kg CO2 emitted per kg of jet fuel burnt.
    pub combustion_factor: f64,
    /// Contrail forcing constants.
    pub contrail_forcing: ContrailForcing,
    /// Admissible altitudes for strategy evaluation.
    pub cruise_band: CruiseBand,
    /// Maximum scene/track time offset the matcher accepts, in seconds.
    pub match_tolerance_secs: i64,
    /// Altitude -> contrail coverage multiplier.
    pub propensity: ContrailPropensityCurve,
    /// Altitude -> fuel-efficiency factor.
    pub fuel_altitude: FuelAltitudeBands,
    /// Reference data per airframe.
    pub aircraft: BTreeMap<AircraftType, AircraftProfile>,
    /// Market records in configured evaluation order.
    pub markets: Vec<MarketProfile>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ground_sample_area_km2: 4.0,
            combustion_factor: 3.16,
            contrail_forcing: ContrailForcing::default(),
            cruise_band: CruiseBand::default(),
            match_tolerance_secs: 15 * 60,
            propensity: ContrailPropensityCurve::default(),
            fuel_altitude: FuelAltitudeBands::default(),
            aircraft: AircraftType::iter().map(|a| (a, a.default_profile())).collect(),
            markets: MarketId::iter().map(MarketId::default_profile).collect(),
        }
    }
}

impl CoreConfig {
    const ENV_GSA: &'static str = "CONTRAIL_GROUND_SAMPLE_AREA_KM2";
    const ENV_COMBUSTION: &'static str = "CONTRAIL_COMBUSTION_FACTOR";
    const ENV_TOLERANCE: &'static str = "CONTRAIL_MATCH_TOLERANCE_SECS";
    const ENV_CRUISE_MIN: &'static str = "CONTRAIL_CRUISE_MIN_M";
    const ENV_CRUISE_MAX: &'static str = "CONTRAIL_CRUISE_MAX_M";

    /// Builds the default configuration, applies `CONTRAIL_*` environment overrides and
    /// validates the result.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if an override cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(gsa) = Self::env_override::<f64>(Self::ENV_GSA)? {
            config.ground_sample_area_km2 = gsa;
        }
        if let Some(cf) = Self::env_override::<f64>(Self::ENV_COMBUSTION)? {
            config.combustion_factor = cf;
        }
        if let Some(tol) = Self::env_override::<i64>(Self::ENV_TOLERANCE)? {
            config.match_tolerance_secs = tol;
        }
        let min = Self::env_override::<u32>(Self::ENV_CRUISE_MIN)?;
        let max = Self::env_override::<u32>(Self::ENV_CRUISE_MAX)?;
        if min.is_some() || max.is_some() {
            config.cruise_band = CruiseBand::new(
                min.unwrap_or(config.cruise_band.min_m()),
                max.unwrap_or(config.cruise_band.max_m()),
            );
        }
        config.validate()?;
        Ok(config)
    }

    fn env_override<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
        match env::var(var) {
            Ok(raw) => {
                let value = raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnv(var.to_string()))?;
                log!("Config override {var}={}", raw.trim());
                Ok(Some(value))
            }
            Err(_) => Ok(None),
        }
    }

    /// Checks every invariant the core relies on.
    ///
    /// # Errors
    /// Returns the first violated invariant as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ground_sample_area_km2.is_finite() && self.ground_sample_area_km2 > 0.0) {
            return Err(ConfigError::InvalidConstant("ground_sample_area_km2"));
        }
        if !(self.combustion_factor.is_finite() && self.combustion_factor > 0.0) {
            return Err(ConfigError::InvalidConstant("combustion_factor"));
        }
        if !self.contrail_forcing.is_plausible() {
            return Err(ConfigError::InvalidConstant("contrail_forcing"));
        }
        if self.match_tolerance_secs < 0 || TimeDelta::try_seconds(self.match_tolerance_secs).is_none() {
            return Err(ConfigError::InvalidConstant("match_tolerance_secs"));
        }
        if self.cruise_band.min_m() >= self.cruise_band.max_m() {
            return Err(ConfigError::InvalidCruiseBand);
        }
        if !self.propensity.is_monotone() {
            return Err(ConfigError::NonMonotonePropensity);
        }
        if !self.fuel_altitude.is_plausible() {
            return Err(ConfigError::InvalidConstant("fuel_altitude"));
        }
        if let Some((a, _)) = self.aircraft.iter().find(|(a, p)| p.aircraft() != **a || !p.is_plausible()) {
            return Err(ConfigError::InvalidAircraft(*a));
        }
        let mut seen = HashSet::new();
        for market in &self.markets {
            if !seen.insert(market.id()) {
                return Err(ConfigError::DuplicateMarket(market.id()));
            }
            if !market.is_plausible() {
                return Err(ConfigError::InvalidMarket(market.id()));
            }
        }
        Ok(())
    }

    /// The matcher's time tolerance as a [`TimeDelta`], saturating for unvalidated configs.
    pub fn match_tolerance(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.match_tolerance_secs).unwrap_or(TimeDelta::MAX)
    }

    pub fn aircraft_profile(&self, aircraft: AircraftType) -> Option<&AircraftProfile> {
        self.aircraft.get(&aircraft)
    }

    pub fn market_profile(&self, market: MarketId) -> Option<&MarketProfile> {
        self.markets.iter().find(|m| m.id() == market)
    }

    /// Configured market identifiers, in evaluation order.
    pub fn market_ids(&self) -> Vec<MarketId> { self.markets.iter().map(MarketProfile::id).collect() }
}
