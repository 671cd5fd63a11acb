use super::DataError;
use crate::util::{BoundingBox, GeoPoint};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single ADS-B style position report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    timestamp: DateTime<Utc>,
    position: GeoPoint,
    /// Barometric altitude in metres.
    altitude_m: f64,
}

impl TrackSample {
    pub fn new(timestamp: DateTime<Utc>, position: GeoPoint, altitude_m: f64) -> Self {
        Self { timestamp, position, altitude_m }
    }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }
    pub fn position(&self) -> GeoPoint { self.position }
    pub fn altitude_m(&self) -> f64 { self.altitude_m }
}

/// The recorded trajectory of one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightTrack {
    /// Flight callsign, used as the flight identifier.
    callsign: String,
    /// Raw aircraft designator as reported; resolved by the emission model.
    aircraft_type: String,
    /// Samples in ascending time order.
    samples: Vec<TrackSample>,
}

impl FlightTrack {
    /// Creates a track after checking sample order and coordinate validity.
    ///
    /// # Errors
    /// Returns a [`DataError`] for empty, unordered or out-of-range tracks.
    pub fn new(
        callsign: impl Into<String>,
        aircraft_type: impl Into<String>,
        samples: Vec<TrackSample>,
    ) -> Result<Self, DataError> {
        let track = Self { callsign: callsign.into(), aircraft_type: aircraft_type.into(), samples };
        track.validate()?;
        Ok(track)
    }

    /// Re-checks the track invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// See [`FlightTrack::new`].
    pub fn validate(&self) -> Result<(), DataError> {
        if self.samples.is_empty() {
            return Err(DataError::EmptyTrack);
        }
        if self.samples.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
            return Err(DataError::UnorderedTrack);
        }
        if self.samples.iter().any(|s| !s.position.is_valid()) {
            return Err(DataError::InvalidBounds(crate::util::GeoBoundsError::OutOfRange));
        }
        if self.samples.iter().any(|s| !s.altitude_m.is_finite() || s.altitude_m < 0.0) {
            return Err(DataError::InvalidAltitude);
        }
        Ok(())
    }

    pub fn callsign(&self) -> &str { &self.callsign }
    pub fn aircraft_type(&self) -> &str { &self.aircraft_type }
    pub fn samples(&self) -> &[TrackSample] { &self.samples }

    /// Great-circle length of the track, summed over consecutive samples, in km.
    pub fn distance_km(&self) -> f64 {
        self.samples.windows(2).map(|w| w[0].position.haversine_km(&w[1].position)).sum()
    }

    /// Smallest box enclosing every sample position.
    pub fn footprint(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.samples.iter().map(|s| &s.position))
    }

    /// Mean reported altitude in metres.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_altitude_m(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().map(|s| s.altitude_m).sum::<f64>() / self.samples.len() as f64)
    }

    /// Mean reported altitude rounded to whole metres.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cruise_altitude_m(&self) -> Option<u32> {
        self.mean_altitude_m().map(|a| a.round().clamp(0.0, f64::from(u32::MAX)) as u32)
    }

    /// Absolute time between `t` and the closest sample.
    ///
    /// Samples are time ordered, so the closest one is adjacent to the insertion point of `t`.
    pub fn closest_time_offset(&self, t: DateTime<Utc>) -> Option<TimeDelta> {
        let split = self.samples.partition_point(|s| s.timestamp < t);
        let before = split.checked_sub(1).and_then(|i| self.samples.get(i));
        let after = self.samples.get(split);
        before.into_iter().chain(after).map(|s| (s.timestamp - t).abs()).min()
    }
}
