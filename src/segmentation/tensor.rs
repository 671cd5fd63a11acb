use crate::util::Grid;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Channel count and spatial extent of a model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Display for InputShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// A channel-first stack of equally sized planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    planes: Vec<Grid<f32>>,
}

impl Tensor {
    /// Wraps `planes`, or returns `None` if they differ in shape.
    pub fn new(planes: Vec<Grid<f32>>) -> Option<Self> {
        let dims = planes.first().map(Grid::dimensions);
        planes.iter().all(|p| Some(p.dimensions()) == dims).then_some(Self { planes })
    }

    pub fn shape(&self) -> InputShape {
        let (width, height) = self.planes.first().map_or((0, 0), Grid::dimensions);
        InputShape { channels: self.planes.len(), height, width }
    }

    pub fn planes(&self) -> &[Grid<f32>] { &self.planes }

    pub fn plane(&self, c: usize) -> Option<&Grid<f32>> { self.planes.get(c) }
}
