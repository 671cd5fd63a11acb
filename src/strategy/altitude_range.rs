use super::StrategyError;
use crate::config::CruiseBand;
use serde::{Deserialize, Serialize};

/// Inclusive, evenly stepped altitude range in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltitudeRange {
    start_m: u32,
    end_m: u32,
    step_m: u32,
}

impl AltitudeRange {
    /// Creates a range covering `start_m, start_m + step_m, ..., end_m`.
    ///
    /// # Errors
    /// [`StrategyError::InvalidRange`] if `step_m` is zero, `start_m > end_m`, or the span
    /// is not a multiple of the step (the end point would not be on the grid).
    pub fn new(start_m: u32, end_m: u32, step_m: u32) -> Result<Self, StrategyError> {
        let range = Self { start_m, end_m, step_m };
        range.validate()?;
        Ok(range)
    }

    /// Re-checks the shape invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// See [`AltitudeRange::new`].
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.step_m == 0 {
            return Err(StrategyError::InvalidRange("step must be positive"));
        }
        if self.start_m > self.end_m {
            return Err(StrategyError::InvalidRange("start lies above end"));
        }
        if (self.end_m - self.start_m) % self.step_m != 0 {
            return Err(StrategyError::InvalidRange("span is not a multiple of the step"));
        }
        Ok(())
    }

    /// Checks that every grid altitude lies inside `band`.
    ///
    /// # Errors
    /// [`StrategyError::OutsideCruiseBand`] naming the first offending altitude.
    pub fn check_within(&self, band: &CruiseBand) -> Result<(), StrategyError> {
        self.validate()?;
        match [self.start_m, self.end_m].into_iter().find(|a| !band.contains(*a)) {
            Some(a) => Err(StrategyError::OutsideCruiseBand(a)),
            None => Ok(()),
        }
    }

    pub fn start_m(&self) -> u32 { self.start_m }
    pub fn end_m(&self) -> u32 { self.end_m }
    pub fn step_m(&self) -> u32 { self.step_m }

    /// Number of grid points, `(end - start) / step + 1`. Zero for a malformed range.
    pub fn len(&self) -> usize {
        if self.step_m == 0 || self.start_m > self.end_m {
            return 0;
        }
        ((self.end_m - self.start_m) / self.step_m) as usize + 1
    }

    /// Never true for a validated range.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Grid altitudes in ascending order.
    pub fn altitudes(&self) -> impl Iterator<Item = u32> + use<> {
        (self.start_m..=self.end_m).step_by(self.step_m.max(1) as usize)
    }
}
