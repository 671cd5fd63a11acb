use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A position on the WGS84 ellipsoid, approximated as a sphere for distance purposes.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    lat: f64,
    /// Longitude in degrees, positive east.
    lon: f64,
}

impl GeoPoint {
    /// Mean earth radius used by the haversine formula, in kilometres.
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    pub const fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }

    pub const fn lat(&self) -> f64 { self.lat }

    pub const fn lon(&self) -> f64 { self.lon }

    /// Returns `true` if the coordinate lies within the valid latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Computes the great-circle distance to `other` using the haversine formula.
    ///
    /// # Arguments
    /// * `other` - The second position.
    ///
    /// # Returns
    /// The distance in kilometres.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Self::EARTH_RADIUS_KM * c
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lat, self.lon)
    }
}

/// Reasons a bounding box can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, strum_macros::Display)]
pub enum GeoBoundsError {
    /// A corner is not a finite coordinate within the valid ranges.
    OutOfRange,
    /// `min` is north or east of `max`.
    Unordered,
}

impl std::error::Error for GeoBoundsError {}

/// An axis-aligned latitude/longitude rectangle. Antimeridian crossing is not supported,
/// so `min.lon() <= max.lon()` always holds.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// South-west corner.
    min: GeoPoint,
    /// North-east corner.
    max: GeoPoint,
}

impl BoundingBox {
    /// Creates a validated bounding box from its south-west and north-east corners.
    ///
    /// # Errors
    /// Returns [`GeoBoundsError`] if a corner is out of range or the corners are unordered.
    pub fn new(min: GeoPoint, max: GeoPoint) -> Result<Self, GeoBoundsError> {
        let bbox = Self { min, max };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Re-checks the geometric invariants. Boxes may arrive deserialized from an untrusted
    /// source, so this is called again at every component boundary.
    ///
    /// # Errors
    /// Returns [`GeoBoundsError`] if a corner is out of range or the corners are unordered.
    pub fn validate(&self) -> Result<(), GeoBoundsError> {
        if !self.min.is_valid() || !self.max.is_valid() {
            Err(GeoBoundsError::OutOfRange)
        } else if self.min.lat > self.max.lat || self.min.lon > self.max.lon {
            Err(GeoBoundsError::Unordered)
        } else {
            Ok(())
        }
    }

    /// Builds the smallest box enclosing all `points`, or `None` for an empty iterator.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Self>, p| {
            Some(match acc {
                None => Self { min: *p, max: *p },
                Some(b) => Self {
                    min: GeoPoint::new(b.min.lat.min(p.lat), b.min.lon.min(p.lon)),
                    max: GeoPoint::new(b.max.lat.max(p.lat), b.max.lon.max(p.lon)),
                },
            })
        })
    }

    pub const fn min(&self) -> GeoPoint { self.min }

    pub const fn max(&self) -> GeoPoint { self.max }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.min.lat + self.max.lat) / 2.0, (self.min.lon + self.max.lon) / 2.0)
    }

    /// Area in square degrees. Only used for overlap ratios, never for physical areas.
    pub fn deg_area(&self) -> f64 {
        (self.max.lat - self.min.lat) * (self.max.lon - self.min.lon)
    }

    /// Returns the shared rectangle of both boxes, or `None` if they do not touch.
    /// Boxes touching along an edge produce a zero-area intersection.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_lat = self.min.lat.max(other.min.lat);
        let min_lon = self.min.lon.max(other.min.lon);
        let max_lat = self.max.lat.min(other.max.lat);
        let max_lon = self.max.lon.min(other.max.lon);
        if min_lat > max_lat || min_lon > max_lon {
            return None;
        }
        Some(BoundingBox {
            min: GeoPoint::new(min_lat, min_lon),
            max: GeoPoint::new(max_lat, max_lon),
        })
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool { self.intersection(other).is_some() }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        (self.min.lat..=self.max.lat).contains(&p.lat) && (self.min.lon..=self.max.lon).contains(&p.lon)
    }

    /// Fraction of `self` covered by `other`, in `[0, 1]`.
    ///
    /// A degenerate `self` (a single point or a meridian/parallel segment) counts as fully
    /// covered as soon as it touches `other`.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        match self.intersection(other) {
            None => 0.0,
            Some(shared) => {
                let own_area = self.deg_area();
                if own_area <= f64::EPSILON {
                    1.0
                } else {
                    (shared.deg_area() / own_area).clamp(0.0, 1.0)
                }
            }
        }
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.min, self.max)
    }
}
