use crate::util::math::piecewise_linear;
use serde::{Deserialize, Serialize};

/// The physically plausible cruise-altitude band. Every altitude the strategy grid
/// evaluates must lie inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CruiseBand {
    /// Lowest admissible cruise altitude in metres.
    min_m: u32,
    /// Highest admissible cruise altitude in metres.
    max_m: u32,
}

impl CruiseBand {
    pub const fn new(min_m: u32, max_m: u32) -> Self { Self { min_m, max_m } }
    pub fn min_m(&self) -> u32 { self.min_m }
    pub fn max_m(&self) -> u32 { self.max_m }
    pub fn contains(&self, altitude_m: u32) -> bool { (self.min_m..=self.max_m).contains(&altitude_m) }
}

impl Default for CruiseBand {
    fn default() -> Self { Self::new(8000, 13000) }
}

/// Monotone mapping from flight altitude to a contrail-coverage multiplier.
///
/// Higher altitudes are colder and more often ice-supersaturated, so the multiplier must not
/// decrease with altitude. Knots are `(altitude_m, multiplier)`, strictly ascending in altitude,
/// with strictly positive multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrailPropensityCurve {
    knots: Vec<(f64, f64)>,
}

impl ContrailPropensityCurve {
    pub fn new(knots: Vec<(f64, f64)>) -> Self { Self { knots } }

    pub fn knots(&self) -> &[(f64, f64)] { &self.knots }

    /// Coverage multiplier at `altitude_m`, held constant outside the knot range.
    pub fn multiplier(&self, altitude_m: u32) -> f64 {
        piecewise_linear(&self.knots, f64::from(altitude_m)).unwrap_or(1.0)
    }

    pub(super) fn is_monotone(&self) -> bool {
        !self.knots.is_empty()
            && self.knots.iter().all(|(a, m)| a.is_finite() && m.is_finite() && *m > 0.0)
            && self.knots.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 <= w[1].1)
    }
}

impl Default for ContrailPropensityCurve {
    /// +30 % coverage per 10 km of altitude, anchored at 1.0 for 10 000 m.
    fn default() -> Self { Self::new(vec![(8000.0, 0.94), (10000.0, 1.0), (13000.0, 1.09)]) }
}

/// Step-wise fuel-efficiency correction by altitude.
///
/// `bands` holds `(threshold_m, factor)` pairs; the first band whose threshold the altitude
/// strictly exceeds applies, otherwise `base_factor` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelAltitudeBands {
    /// Sorted by descending threshold.
    bands: Vec<(u32, f64)>,
    /// Factor below the lowest threshold.
    base_factor: f64,
}

impl FuelAltitudeBands {
    pub fn new(mut bands: Vec<(u32, f64)>, base_factor: f64) -> Self {
        bands.sort_by(|a, b| b.0.cmp(&a.0));
        Self { bands, base_factor }
    }

    /// A correction that never changes the fuel burn.
    pub fn neutral() -> Self { Self::new(Vec::new(), 1.0) }

    pub fn factor(&self, altitude_m: u32) -> f64 {
        self.bands
            .iter()
            .find(|(threshold, _)| altitude_m > *threshold)
            .map_or(self.base_factor, |(_, f)| *f)
    }

    pub(super) fn is_plausible(&self) -> bool {
        self.base_factor.is_finite()
            && self.base_factor > 0.0
            && self.bands.iter().all(|(_, f)| f.is_finite() && *f > 0.0)
    }
}

impl Default for FuelAltitudeBands {
    fn default() -> Self { Self::new(vec![(9000, 0.85), (6000, 0.92)], 1.10) }
}
