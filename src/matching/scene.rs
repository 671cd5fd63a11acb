use crate::util::{BoundingBox, GeoBoundsError, Grid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

/// Structural defects of scene or track input data.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Fewer spectral bands than the minimum of three.
    InsufficientBands(usize),
    /// A band's raster does not match the stack's shape.
    BandShapeMismatch(u8),
    /// A raster has zero width or height.
    EmptyRaster,
    /// A band contains NaN or infinite values.
    NonFiniteBand(u8),
    /// The footprint or a position violates coordinate invariants.
    InvalidBounds(GeoBoundsError),
    /// A flight track without samples.
    EmptyTrack,
    /// Track samples are not in ascending time order.
    UnorderedTrack,
    /// A track sample has a non-finite or negative altitude.
    InvalidAltitude,
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::InsufficientBands(n) => write!(f, "expected at least 3 bands, got {n}"),
            DataError::BandShapeMismatch(b) => write!(f, "band {b} does not match the stack shape"),
            DataError::EmptyRaster => write!(f, "raster has no pixels"),
            DataError::NonFiniteBand(b) => write!(f, "band {b} contains non-finite values"),
            DataError::InvalidBounds(e) => write!(f, "invalid coordinates: {e}"),
            DataError::EmptyTrack => write!(f, "track has no samples"),
            DataError::UnorderedTrack => write!(f, "track samples are not time ordered"),
            DataError::InvalidAltitude => write!(f, "track contains an invalid altitude"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<GeoBoundsError> for DataError {
    fn from(value: GeoBoundsError) -> Self { DataError::InvalidBounds(value) }
}

/// Spatially aligned calibrated bands of one scene, keyed by sensor band number.
/// All rasters share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStack {
    width: usize,
    height: usize,
    bands: BTreeMap<u8, Grid<f32>>,
}

impl BandStack {
    /// Minimum number of spectral bands a scene must carry.
    pub const MIN_BANDS: usize = 3;

    /// Assembles a stack and checks the shape invariants.
    ///
    /// # Errors
    /// Returns a [`DataError`] if fewer than [`BandStack::MIN_BANDS`] bands are given,
    /// a raster is empty, or the rasters differ in shape.
    pub fn new(bands: BTreeMap<u8, Grid<f32>>) -> Result<Self, DataError> {
        let (width, height) = bands.values().next().map_or((0, 0), Grid::dimensions);
        let stack = Self { width, height, bands };
        stack.validate()?;
        Ok(stack)
    }

    /// Re-checks the shape invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// See [`BandStack::new`].
    pub fn validate(&self) -> Result<(), DataError> {
        if self.bands.len() < Self::MIN_BANDS {
            return Err(DataError::InsufficientBands(self.bands.len()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(DataError::EmptyRaster);
        }
        for (id, band) in &self.bands {
            if band.dimensions() != (self.width, self.height) {
                return Err(DataError::BandShapeMismatch(*id));
            }
            if band.iter().any(|v| !v.is_finite()) {
                return Err(DataError::NonFiniteBand(*id));
            }
        }
        Ok(())
    }

    pub fn band(&self, id: u8) -> Option<&Grid<f32>> { self.bands.get(&id) }

    pub fn band_ids(&self) -> impl Iterator<Item = u8> + '_ { self.bands.keys().copied() }

    /// Returns `(width, height)` shared by every band.
    pub fn dimensions(&self) -> (usize, usize) { (self.width, self.height) }
}

/// One satellite acquisition: identity, capture time, footprint and band rasters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteScene {
    /// Scene identifier, e.g. the source granule name.
    id: String,
    /// Nominal capture time of the scene.
    captured_at: DateTime<Utc>,
    /// Geographic footprint.
    footprint: BoundingBox,
    /// Calibrated band rasters.
    bands: BandStack,
}

impl SatelliteScene {
    /// Creates a scene after validating the footprint and band stack.
    ///
    /// # Errors
    /// Returns a [`DataError`] if the footprint or the band stack is malformed.
    pub fn new(
        id: impl Into<String>,
        captured_at: DateTime<Utc>,
        footprint: BoundingBox,
        bands: BandStack,
    ) -> Result<Self, DataError> {
        let scene = Self { id: id.into(), captured_at, footprint, bands };
        scene.validate()?;
        Ok(scene)
    }

    /// Re-checks every invariant of the scene.
    ///
    /// # Errors
    /// See [`SatelliteScene::new`].
    pub fn validate(&self) -> Result<(), DataError> {
        self.footprint.validate()?;
        self.bands.validate()
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn captured_at(&self) -> DateTime<Utc> { self.captured_at }
    pub fn footprint(&self) -> &BoundingBox { &self.footprint }
    pub fn bands(&self) -> &BandStack { &self.bands }
}
