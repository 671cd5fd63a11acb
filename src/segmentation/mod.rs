//! Pixel-level contrail segmentation: band preprocessing, model inference and masking.

mod channel_recipe;
mod contrail_mask;
mod engine;
mod model;
mod tensor;

#[cfg(test)]
mod tests;

pub use channel_recipe::{ChannelNorm, ChannelRecipe, ChannelSource, InputRecipe};
pub use contrail_mask::{ContrailMask, MaskStats};
pub use engine::{SegmentationEngine, SegmentationError};
pub use model::{ConvSegmentationModel, ModelError, SegmentationModel};
pub use tensor::{InputShape, Tensor};
