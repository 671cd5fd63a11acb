use crate::util::Grid;
use bitvec::{bitbox, boxed::BitBox, order::Lsb0};
use serde::{Deserialize, Serialize};

/// Binary contrail mask plus the probability grid it was thresholded from.
///
/// A mask is a derived value: a different threshold produces a new mask, never an
/// in-place edit of an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrailMask {
    /// Per-pixel contrail probability in `[0, 1]`.
    probability: Grid<f32>,
    /// Bit-packed row-major mask, set where `probability >= threshold`.
    mask: BitBox<usize, Lsb0>,
    /// Threshold used to derive `mask`.
    threshold: f32,
    /// Ground area represented by one pixel in km².
    ground_sample_area_km2: f64,
}

/// Summary statistics of a [`ContrailMask`], the part of a mask that leaves the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskStats {
    pub pixel_count: usize,
    pub total_pixels: usize,
    /// `pixel_count / total_pixels`, always within `[0, 1]`.
    pub coverage_fraction: f64,
    /// `pixel_count * ground_sample_area_km2`
    pub area_km2: f64,
    /// Mean probability over the masked pixels.
    pub intensity: f64,
    pub threshold: f32,
}

impl ContrailMask {
    /// Thresholds a probability grid.
    ///
    /// # Arguments
    /// * `probability` - Model output with values in `[0, 1]`.
    /// * `threshold` - Cut-off; a pixel is set when its probability is at least `threshold`.
    /// * `ground_sample_area_km2` - Ground area of one pixel.
    pub fn from_probability(probability: Grid<f32>, threshold: f32, ground_sample_area_km2: f64) -> Self {
        let mut mask = bitbox![usize, Lsb0; 0; probability.len()];
        for (i, p) in probability.iter().enumerate() {
            if *p >= threshold {
                mask.set(i, true);
            }
        }
        Self { probability, mask, threshold, ground_sample_area_km2 }
    }

    pub fn probability(&self) -> &Grid<f32> { &self.probability }

    pub fn threshold(&self) -> f32 { self.threshold }

    /// Returns `(width, height)` of the mask.
    pub fn dimensions(&self) -> (usize, usize) { self.probability.dimensions() }

    /// Checks whether the pixel at `(x, y)` is classified as contrail.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (w, h) = self.dimensions();
        x < w && y < h && self.mask[y * w + x]
    }

    /// Number of contrail pixels.
    pub fn pixel_count(&self) -> usize { self.mask.count_ones() }

    pub fn total_pixels(&self) -> usize { self.mask.len() }

    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_fraction(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.pixel_count() as f64 / self.total_pixels() as f64
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn area_km2(&self) -> f64 { self.pixel_count() as f64 * self.ground_sample_area_km2 }

    /// Mean probability over set pixels, `0.0` for an empty mask.
    #[allow(clippy::cast_precision_loss)]
    pub fn intensity(&self) -> f64 {
        let count = self.pixel_count();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 =
            self.mask.iter_ones().map(|i| f64::from(self.probability.cells()[i])).sum();
        sum / count as f64
    }

    pub fn stats(&self) -> MaskStats {
        MaskStats {
            pixel_count: self.pixel_count(),
            total_pixels: self.total_pixels(),
            coverage_fraction: self.coverage_fraction(),
            area_km2: self.area_km2(),
            intensity: self.intensity(),
            threshold: self.threshold,
        }
    }
}
