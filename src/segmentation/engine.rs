use super::{ContrailMask, InputShape, ModelError, SegmentationModel, Tensor};
use crate::matching::BandStack;
use crate::{event, info};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

/// Failures of preprocessing or inference.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// The input does not have the exact shape the model expects.
    InputShape { expected: InputShape, actual: InputShape },
    /// The detection threshold is outside the open interval `(0, 1)`.
    InvalidThreshold(f32),
    /// The preprocessing recipe references a band the scene lacks.
    MissingBand(u8),
    /// Preprocessed planes differ in shape.
    RaggedPlanes,
    /// The model produced NaN or infinite probabilities.
    NonFiniteOutput,
    /// The model produced a probability outside `[0, 1]`.
    ProbabilityOutOfRange(f32),
    /// The blocking inference task did not complete.
    Aborted,
    /// Model weights are unusable.
    Model(String),
}

impl Display for SegmentationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentationError::InputShape { expected, actual } => {
                write!(f, "input shape {actual} does not match model shape {expected}")
            }
            SegmentationError::InvalidThreshold(t) => {
                write!(f, "threshold {t} is outside (0, 1)")
            }
            SegmentationError::MissingBand(b) => write!(f, "scene lacks band {b}"),
            SegmentationError::RaggedPlanes => write!(f, "input planes differ in shape"),
            SegmentationError::NonFiniteOutput => write!(f, "model produced non-finite output"),
            SegmentationError::ProbabilityOutOfRange(p) => {
                write!(f, "model produced probability {p} outside [0, 1]")
            }
            SegmentationError::Aborted => write!(f, "inference task was aborted"),
            SegmentationError::Model(e) => write!(f, "model error: {e}"),
        }
    }
}

impl std::error::Error for SegmentationError {}

impl From<ModelError> for SegmentationError {
    fn from(value: ModelError) -> Self { SegmentationError::Model(value.to_string()) }
}

/// Stateless inference front-end around a shared, read-only model.
#[derive(Clone)]
pub struct SegmentationEngine {
    model: Arc<dyn SegmentationModel>,
    ground_sample_area_km2: f64,
}

impl SegmentationEngine {
    pub fn new(model: Arc<dyn SegmentationModel>, ground_sample_area_km2: f64) -> Self {
        Self { model, ground_sample_area_km2 }
    }

    pub fn model(&self) -> &Arc<dyn SegmentationModel> { &self.model }

    pub fn ground_sample_area_km2(&self) -> f64 { self.ground_sample_area_km2 }

    /// Applies the model's channel recipe to the calibrated bands.
    ///
    /// # Errors
    /// [`SegmentationError::MissingBand`] if a referenced band is absent.
    pub fn prepare(&self, bands: &BandStack) -> Result<Tensor, SegmentationError> {
        self.model.recipe().build_tensor(bands)
    }

    /// Runs inference and thresholds the probability map.
    ///
    /// # Arguments
    /// * `input` - A tensor of exactly the model's input shape. It is never resized.
    /// * `threshold` - Detection threshold in `(0, 1)`.
    ///
    /// # Errors
    /// [`SegmentationError::InvalidThreshold`], [`SegmentationError::InputShape`], an output
    /// that is not a probability map, or any error raised by the model.
    pub fn segment(&self, input: &Tensor, threshold: f32) -> Result<ContrailMask, SegmentationError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(SegmentationError::InvalidThreshold(threshold));
        }
        let expected = self.model.input_shape();
        let actual = input.shape();
        if expected != actual {
            return Err(SegmentationError::InputShape { expected, actual });
        }
        let probability = self.model.infer(input)?;
        if probability.dimensions() != (actual.width, actual.height) {
            return Err(SegmentationError::InputShape {
                expected,
                actual: InputShape {
                    channels: actual.channels,
                    height: probability.height(),
                    width: probability.width(),
                },
            });
        }
        if let Some(p) = probability.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(if p.is_finite() {
                SegmentationError::ProbabilityOutOfRange(*p)
            } else {
                SegmentationError::NonFiniteOutput
            });
        }
        let mask = ContrailMask::from_probability(probability, threshold, self.ground_sample_area_km2);
        event!(
            "Segmented {actual} input at threshold {threshold}: {} contrail pixels",
            mask.pixel_count()
        );
        Ok(mask)
    }

    /// Preprocesses and segments one scene's bands.
    ///
    /// # Errors
    /// See [`SegmentationEngine::prepare`] and [`SegmentationEngine::segment`].
    pub fn segment_bands(&self, bands: &BandStack, threshold: f32) -> Result<ContrailMask, SegmentationError> {
        let input = self.prepare(bands)?;
        self.segment(&input, threshold)
    }

    /// Same as [`SegmentationEngine::segment_bands`] but runs on the blocking thread pool,
    /// keeping the async executor free during inference.
    ///
    /// # Errors
    /// [`SegmentationError::Aborted`] if the blocking task panicked or was cancelled.
    pub async fn segment_blocking(
        &self,
        bands: Arc<BandStack>,
        threshold: f32,
    ) -> Result<ContrailMask, SegmentationError> {
        let engine = self.clone();
        let res = tokio::task::spawn_blocking(move || engine.segment_bands(&bands, threshold))
            .await
            .map_err(|_| SegmentationError::Aborted)?;
        if let Ok(mask) = &res {
            info!(
                "Contrail mask ready: {:.2}% coverage, {:.1} km²",
                mask.coverage_fraction() * 100.0,
                mask.area_km2()
            );
        }
        res
    }
}
