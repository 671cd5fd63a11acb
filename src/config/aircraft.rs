use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::LazyLock};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// The closed set of airframes with known fuel-burn characteristics.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, EnumIter, Serialize, Deserialize,
)]
pub enum AircraftType {
    A320,
    A321,
    B737_800,
    B737_900,
    A330_300,
    A350_900,
    B777_300ER,
    B787_9,
    B747_400,
    A380,
}

impl AircraftType {
    /// Canonical manufacturer designator, e.g. `"B737-800"`.
    pub fn designator(self) -> &'static str {
        match self {
            AircraftType::A320 => "A320",
            AircraftType::A321 => "A321",
            AircraftType::B737_800 => "B737-800",
            AircraftType::B737_900 => "B737-900",
            AircraftType::A330_300 => "A330-300",
            AircraftType::A350_900 => "A350-900",
            AircraftType::B777_300ER => "B777-300ER",
            AircraftType::B787_9 => "B787-9",
            AircraftType::B747_400 => "B747-400",
            AircraftType::A380 => "A380",
        }
    }

    /// Reference emission characteristics for this airframe.
    pub fn default_profile(self) -> AircraftProfile {
        let (cruise, ef_nox, ef_soot) = match self {
            AircraftType::A320 => (3.0, 0.013, 0.0004),
            AircraftType::A321 => (2.7, 0.013, 0.0004),
            AircraftType::B737_800 => (2.4, 0.014, 0.0005),
            AircraftType::B737_900 => (2.6, 0.014, 0.0005),
            AircraftType::A330_300 => (5.5, 0.012, 0.0003),
            AircraftType::A350_900 => (5.8, 0.011, 0.0003),
            AircraftType::B777_300ER => (7.5, 0.013, 0.0004),
            AircraftType::B787_9 => (5.5, 0.010, 0.0002),
            AircraftType::B747_400 => (12.0, 0.015, 0.0006),
            AircraftType::A380 => (11.5, 0.012, 0.0004),
        };
        AircraftProfile {
            aircraft: self,
            fuel_burn_cruise: cruise,
            ef_nox,
            ef_h2o: AircraftProfile::EF_H2O,
            ef_soot,
        }
    }
}

/// Matches designators like `A320`, `A320-214`, `B737-8H4` or `b777-300er`.
/// Group 1 is the family (`B737`), group 2 the optional series digit (`8`).
static DESIGNATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([AB]\d{3})(?:-(\d)[0-9A-Z]*)?$").unwrap()
});

impl FromStr for AircraftType {
    type Err = String;

    /// Resolves a designator to a known airframe.
    ///
    /// Exact designators match directly. Variant designators resolve to their family/series
    /// entry (`A320-214` -> `A320`, `B737-824` -> `B737-800`, `B777-300` -> `B777-300ER`).
    /// Anything else is rejected with the normalised input, never mapped to a fallback type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_uppercase();
        if let Some(exact) = Self::iter().find(|t| t.designator() == norm) {
            return Ok(exact);
        }
        let caps = DESIGNATOR_REGEX.captures(&norm).ok_or_else(|| norm.clone())?;
        let family = caps.get(1).map_or("", |m| m.as_str());
        if let Some(series) = caps.get(2) {
            let prefix = format!("{family}-{}", series.as_str());
            let mut series_match = Self::iter().filter(|t| t.designator().starts_with(&prefix));
            if let (Some(only), None) = (series_match.next(), series_match.next()) {
                return Ok(only);
            }
        }
        Self::iter().find(|t| t.designator() == family).ok_or(norm)
    }
}

/// Immutable emission characteristics of one airframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftProfile {
    /// The airframe this profile describes.
    aircraft: AircraftType,
    /// Cruise fuel burn in kg per km. This is the factor used by emission accounting.
    fuel_burn_cruise: f64,
    /// kg NOx per kg fuel.
    ef_nox: f64,
    /// kg H2O per kg fuel.
    ef_h2o: f64,
    /// kg soot per kg fuel.
    ef_soot: f64,
}

impl AircraftProfile {
    const EF_H2O: f64 = 1.23;

    pub fn aircraft(&self) -> AircraftType { self.aircraft }
    pub fn fuel_burn_cruise(&self) -> f64 { self.fuel_burn_cruise }
    pub fn ef_nox(&self) -> f64 { self.ef_nox }
    pub fn ef_h2o(&self) -> f64 { self.ef_h2o }
    pub fn ef_soot(&self) -> f64 { self.ef_soot }

    /// Returns a copy with a different cruise fuel-burn factor.
    pub fn with_fuel_burn_cruise(mut self, kg_per_km: f64) -> Self {
        self.fuel_burn_cruise = kg_per_km;
        self
    }

    /// Checks that every factor is finite and non-negative and cruise burn is positive.
    pub(super) fn is_plausible(&self) -> bool {
        [self.fuel_burn_cruise, self.ef_nox, self.ef_h2o, self.ef_soot]
            .iter()
            .all(|f| f.is_finite() && *f >= 0.0)
            && self.fuel_burn_cruise > 0.0
    }
}
