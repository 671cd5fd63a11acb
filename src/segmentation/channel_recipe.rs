use super::{SegmentationError, Tensor};
use crate::matching::BandStack;
use crate::util::{Grid, math::normalize};
use serde::{Deserialize, Serialize};

/// Where a model input channel comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelSource {
    /// A single calibrated band.
    Band(u8),
    /// Band `.0` minus band `.1`.
    Difference(u8, u8),
}

/// Per-channel normalisation, fixed when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelNorm {
    /// `(v - min) / (max - min)`
    MinMax { min: f32, max: f32 },
    /// `(v - mean) / std`
    MeanStd { mean: f32, std: f32 },
}

impl ChannelNorm {
    /// Normalises one value. Degenerate statistics (zero span or zero std) map to `0.0`.
    pub fn apply(&self, v: f32) -> f32 {
        match *self {
            ChannelNorm::MinMax { min, max } => normalize(v, min, max).unwrap_or(0.0),
            ChannelNorm::MeanStd { mean, std } => {
                if std.abs() <= f32::EPSILON { 0.0 } else { (v - mean) / std }
            }
        }
    }

    fn is_plausible(&self) -> bool {
        match *self {
            ChannelNorm::MinMax { min, max } => min.is_finite() && max.is_finite() && min < max,
            ChannelNorm::MeanStd { mean, std } => mean.is_finite() && std.is_finite() && std > 0.0,
        }
    }
}

/// Recipe for one model input channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecipe {
    pub source: ChannelSource,
    pub norm: ChannelNorm,
    /// Clip the normalised value to `[0, 1]`.
    pub clip: bool,
}

/// Ordered channel recipes turning a [`BandStack`] into a model input [`Tensor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecipe {
    channels: Vec<ChannelRecipe>,
}

impl InputRecipe {
    pub fn new(channels: Vec<ChannelRecipe>) -> Self { Self { channels } }

    /// The ash false-colour composite built from the 8.4 µm (11), 11.2 µm (14) and
    /// 12.3 µm (15) infrared bands:
    /// - r: split-window difference `B15 - B14` over `[-4, 2]` K
    /// - g: cloud-phase difference `B14 - B11` over `[-4, 5]` K
    /// - b: brightness temperature `B14` over `[243, 303]` K
    pub fn ash() -> Self {
        Self::new(vec![
            ChannelRecipe {
                source: ChannelSource::Difference(15, 14),
                norm: ChannelNorm::MinMax { min: -4.0, max: 2.0 },
                clip: true,
            },
            ChannelRecipe {
                source: ChannelSource::Difference(14, 11),
                norm: ChannelNorm::MinMax { min: -4.0, max: 5.0 },
                clip: true,
            },
            ChannelRecipe {
                source: ChannelSource::Band(14),
                norm: ChannelNorm::MinMax { min: 243.0, max: 303.0 },
                clip: true,
            },
        ])
    }

    pub fn channels(&self) -> &[ChannelRecipe] { &self.channels }

    pub fn len(&self) -> usize { self.channels.len() }

    pub fn is_empty(&self) -> bool { self.channels.is_empty() }

    pub(super) fn is_plausible(&self) -> bool {
        !self.channels.is_empty() && self.channels.iter().all(|c| c.norm.is_plausible())
    }

    /// Derives and normalises every channel from `bands`.
    ///
    /// # Errors
    /// [`SegmentationError::MissingBand`] if the recipe references an absent band.
    pub fn build_tensor(&self, bands: &BandStack) -> Result<Tensor, SegmentationError> {
        let fetch = |id: u8| bands.band(id).ok_or(SegmentationError::MissingBand(id));
        let mut planes = Vec::with_capacity(self.channels.len());
        for recipe in &self.channels {
            let raw: Grid<f32> = match recipe.source {
                ChannelSource::Band(b) => fetch(b)?.clone(),
                ChannelSource::Difference(a, b) => {
                    let (lhs, rhs) = (fetch(a)?, fetch(b)?);
                    let (w, h) = lhs.dimensions();
                    Grid::from_fn(w, h, |x, y| lhs.get(x, y) - rhs.get(x, y))
                }
            };
            planes.push(raw.map(|v| {
                let n = recipe.norm.apply(v);
                if recipe.clip { n.clamp(0.0, 1.0) } else { n }
            }));
        }
        Tensor::new(planes).ok_or(SegmentationError::RaggedPlanes)
    }
}

impl Default for InputRecipe {
    fn default() -> Self { Self::ash() }
}
