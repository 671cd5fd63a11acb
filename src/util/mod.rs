//! Small geometric and numeric building blocks shared by every analysis stage.

mod geo;
mod grid;
pub mod math;

#[cfg(test)]
mod tests;

pub use geo::{BoundingBox, GeoBoundsError, GeoPoint};
pub use grid::Grid;
