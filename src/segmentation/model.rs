use super::{InputRecipe, InputShape, SegmentationError, Tensor};
use crate::util::{Grid, math::sigmoid};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    path::Path,
};

/// Errors raised while loading or persisting model weights.
#[derive(Debug)]
pub enum ModelError {
    /// The weight file could not be read or written.
    Io(std::io::Error),
    /// The weight file is not a valid encoding.
    Decode(bincode::error::DecodeError),
    /// The weights could not be encoded.
    Encode(bincode::error::EncodeError),
    /// The decoded weights contradict each other.
    Inconsistent(&'static str),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "cannot access model weights: {e}"),
            ModelError::Decode(e) => write!(f, "cannot decode model weights: {e}"),
            ModelError::Encode(e) => write!(f, "cannot encode model weights: {e}"),
            ModelError::Inconsistent(what) => write!(f, "inconsistent model weights: {what}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<std::io::Error> for ModelError {
    fn from(value: std::io::Error) -> Self { ModelError::Io(value) }
}

/// A loaded, read-only segmentation network.
///
/// Implementations must be deterministic: equal inputs yield bit-identical outputs.
pub trait SegmentationModel: Send + Sync {
    /// The exact input shape the model accepts.
    fn input_shape(&self) -> InputShape;

    /// Channel preprocessing the model was trained with.
    fn recipe(&self) -> &InputRecipe;

    /// Runs inference on an input whose shape equals [`SegmentationModel::input_shape`].
    ///
    /// # Returns
    /// A probability grid of the input's spatial shape with values in `[0, 1]`.
    ///
    /// # Errors
    /// Implementations may reject inputs or report non-finite activations.
    fn infer(&self, input: &Tensor) -> Result<Grid<f32>, SegmentationError>;
}

/// Single-layer convolutional detector: one 3x3 kernel per input channel, summed, biased and
/// passed through a logistic output. Borders are zero padded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvSegmentationModel {
    /// Accepted input shape.
    shape: InputShape,
    /// Preprocessing recipe, one entry per channel.
    recipe: InputRecipe,
    /// Row-major 3x3 kernels, one per channel.
    kernels: Vec<[f32; 9]>,
    /// Output bias added before the sigmoid.
    bias: f32,
}

impl ConvSegmentationModel {
    /// Creates a model from explicit weights.
    ///
    /// # Errors
    /// [`ModelError::Inconsistent`] if kernels, recipe and shape disagree or weights are not finite.
    pub fn new(
        shape: InputShape,
        recipe: InputRecipe,
        kernels: Vec<[f32; 9]>,
        bias: f32,
    ) -> Result<Self, ModelError> {
        let model = Self { shape, recipe, kernels, bias };
        model.validate()?;
        Ok(model)
    }

    /// Reference weights for the ash composite: responds to high split-window difference
    /// (thin ice cloud) that stands out against its 8-neighbourhood.
    /// Not a trained network; used by tests and when no weight file is configured.
    pub fn reference(height: usize, width: usize) -> Self {
        let line_kernel = [-0.5, -0.5, -0.5, -0.5, 8.0, -0.5, -0.5, -0.5, -0.5];
        Self {
            shape: InputShape { channels: 3, height, width },
            recipe: InputRecipe::ash(),
            kernels: vec![line_kernel, [0.0; 9], [0.0; 9]],
            bias: -2.0,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.shape.channels == 0 || self.shape.height == 0 || self.shape.width == 0 {
            return Err(ModelError::Inconsistent("empty input shape"));
        }
        if self.kernels.len() != self.shape.channels {
            return Err(ModelError::Inconsistent("kernel count differs from channel count"));
        }
        if self.recipe.len() != self.shape.channels || !self.recipe.is_plausible() {
            return Err(ModelError::Inconsistent("preprocessing recipe does not fit the input"));
        }
        if !self.bias.is_finite() || self.kernels.iter().flatten().any(|w| !w.is_finite()) {
            return Err(ModelError::Inconsistent("non-finite weights"));
        }
        Ok(())
    }

    /// Decodes and validates bincode-encoded weights.
    ///
    /// # Errors
    /// [`ModelError::Decode`] for malformed bytes, [`ModelError::Inconsistent`] for invalid weights.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let (model, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(ModelError::Decode)?;
        model.validate()?;
        Ok(model)
    }

    /// Encodes the weights with bincode.
    ///
    /// # Errors
    /// [`ModelError::Encode`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(ModelError::Encode)
    }

    /// Loads weights from a file written by [`ConvSegmentationModel::save`].
    ///
    /// # Errors
    /// See [`ConvSegmentationModel::from_bytes`]; I/O failures map to [`ModelError::Io`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    /// Persists the weights.
    ///
    /// # Errors
    /// [`ModelError::Io`] or [`ModelError::Encode`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn convolve_at(&self, input: &Tensor, x: usize, y: usize) -> f32 {
        let mut acc = self.bias;
        for (plane, kernel) in input.planes().iter().zip(&self.kernels) {
            for (k, weight) in kernel.iter().enumerate() {
                let dx = (k % 3) as isize - 1;
                let dy = (k / 3) as isize - 1;
                let v = plane.get_checked(x as isize + dx, y as isize + dy).unwrap_or(0.0);
                acc += weight * v;
            }
        }
        acc
    }
}

impl SegmentationModel for ConvSegmentationModel {
    fn input_shape(&self) -> InputShape { self.shape }

    fn recipe(&self) -> &InputRecipe { &self.recipe }

    fn infer(&self, input: &Tensor) -> Result<Grid<f32>, SegmentationError> {
        let actual = input.shape();
        if actual != self.shape {
            return Err(SegmentationError::InputShape { expected: self.shape, actual });
        }
        let prob = Grid::from_fn(actual.width, actual.height, |x, y| sigmoid(self.convolve_at(input, x, y)));
        if prob.iter().any(|p| !p.is_finite()) {
            return Err(SegmentationError::NonFiniteOutput);
        }
        Ok(prob)
    }
}
