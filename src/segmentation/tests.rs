use super::{
    ChannelNorm, ContrailMask, ConvSegmentationModel, InputRecipe, InputShape, ModelError,
    SegmentationEngine, SegmentationError, SegmentationModel, Tensor,
};
use crate::matching::BandStack;
use crate::util::Grid;
use itertools::Itertools;
use rand::Rng;
use std::{collections::BTreeMap, sync::Arc};

const GSA_KM2: f64 = 4.0;

/// Bands 11/14/15 with a bright split-window line along row `line_row`.
fn line_stack(size: usize, line_row: usize) -> BandStack {
    let mut bands = BTreeMap::new();
    bands.insert(11, Grid::new(size, size, 258.0));
    bands.insert(14, Grid::new(size, size, 260.0));
    bands.insert(15, Grid::from_fn(size, size, |_, y| if y == line_row { 262.0 } else { 256.0 }));
    BandStack::new(bands).unwrap()
}

fn random_tensor(size: usize) -> Tensor {
    let mut rng = rand::rng();
    let planes = (0..3).map(|_| Grid::from_fn(size, size, |_, _| rng.random_range(0.0_f32..1.0))).collect();
    Tensor::new(planes).unwrap()
}

fn reference_engine(size: usize) -> SegmentationEngine {
    SegmentationEngine::new(Arc::new(ConvSegmentationModel::reference(size, size)), GSA_KM2)
}

#[test]
fn test_ash_recipe_normalises_and_clips() {
    let tensor = InputRecipe::ash().build_tensor(&line_stack(4, 1)).unwrap();
    assert_eq!(tensor.shape(), InputShape { channels: 3, height: 4, width: 4 });
    let r = tensor.plane(0).unwrap();
    assert!((r.get(0, 1) - 1.0).abs() < 1e-6);
    assert!(r.get(0, 0).abs() < 1e-6);
    // B14 - B11 = 2 K over [-4, 5]
    assert!((tensor.plane(1).unwrap().get(2, 2) - 6.0 / 9.0).abs() < 1e-6);
    assert!(tensor.planes().iter().flat_map(Grid::iter).all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_channel_norm_degenerate_statistics() {
    assert!(ChannelNorm::MinMax { min: 1.0, max: 1.0 }.apply(5.0).abs() < f32::EPSILON);
    assert!(ChannelNorm::MeanStd { mean: 1.0, std: 0.0 }.apply(5.0).abs() < f32::EPSILON);
    assert!((ChannelNorm::MeanStd { mean: 1.0, std: 2.0 }.apply(5.0) - 2.0).abs() < 1e-6);
}

#[test]
fn test_missing_band_is_reported() {
    let mut bands = BTreeMap::new();
    for id in [1, 2, 3] {
        bands.insert(id, Grid::new(4, 4, 250.0));
    }
    let stack = BandStack::new(bands).unwrap();
    assert_eq!(reference_engine(4).prepare(&stack).unwrap_err(), SegmentationError::MissingBand(15));
}

#[test]
fn test_reference_detector_finds_line() {
    let engine = reference_engine(8);
    let mask = engine.segment_bands(&line_stack(8, 4), 0.5).unwrap();
    assert_eq!(mask.pixel_count(), 8);
    assert!((0..8).all(|x| mask.is_set(x, 4)));
    assert!(!mask.is_set(0, 3));
    assert!(!mask.is_set(8, 4));
    assert!((mask.area_km2() - 32.0).abs() < 1e-9);
    assert!((mask.coverage_fraction() - 0.125).abs() < 1e-12);
    assert!(mask.intensity() > 0.99 && mask.intensity() <= 1.0);
}

#[test]
fn test_threshold_monotonicity() {
    let engine = reference_engine(16);
    let input = random_tensor(16);
    let mut rng = rand::rng();
    let mut thresholds: Vec<f32> = (0..12).map(|_| rng.random_range(0.01..0.99)).collect();
    thresholds.sort_by(f32::total_cmp);
    let counts: Vec<usize> = thresholds
        .iter()
        .map(|t| engine.segment(&input, *t).unwrap().pixel_count())
        .collect();
    for (lo, hi) in counts.iter().tuple_windows() {
        assert!(hi <= lo, "pixel count grew with threshold: {counts:?}");
    }
}

#[test]
fn test_coverage_bounds_and_exact_area() {
    let engine = reference_engine(12);
    let mut rng = rand::rng();
    for _ in 0..20 {
        let mask = engine.segment(&random_tensor(12), rng.random_range(0.01..0.99)).unwrap();
        let stats = mask.stats();
        assert!((0.0..=1.0).contains(&stats.coverage_fraction));
        #[allow(clippy::cast_precision_loss)]
        let expected = stats.pixel_count as f64 * GSA_KM2;
        assert!((stats.area_km2 - expected).abs() < f64::EPSILON * expected.max(1.0));
        assert_eq!(stats.total_pixels, 144);
    }
}

#[test]
fn test_segmentation_is_deterministic() {
    let engine = reference_engine(10);
    let input = random_tensor(10);
    let first = engine.segment(&input, 0.4).unwrap();
    let second = engine.segment(&input, 0.4).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let engine = reference_engine(8);
    let err = engine.segment(&random_tensor(4), 0.5).unwrap_err();
    assert_eq!(
        err,
        SegmentationError::InputShape {
            expected: InputShape { channels: 3, height: 8, width: 8 },
            actual: InputShape { channels: 3, height: 4, width: 4 },
        }
    );
}

#[test]
fn test_threshold_must_be_open_unit_interval() {
    let engine = reference_engine(4);
    let input = random_tensor(4);
    for t in [0.0, 1.0, -0.2, f32::NAN] {
        assert!(matches!(engine.segment(&input, t), Err(SegmentationError::InvalidThreshold(_))));
    }
}

/// Emits a fixed output grid regardless of the input.
struct FixedOutput {
    recipe: InputRecipe,
    output: Grid<f32>,
}

impl SegmentationModel for FixedOutput {
    fn input_shape(&self) -> InputShape { InputShape { channels: 3, height: 2, width: 2 } }

    fn recipe(&self) -> &InputRecipe { &self.recipe }

    fn infer(&self, _input: &Tensor) -> Result<Grid<f32>, SegmentationError> { Ok(self.output.clone()) }
}

fn fixed_engine(output: Grid<f32>) -> SegmentationEngine {
    SegmentationEngine::new(Arc::new(FixedOutput { recipe: InputRecipe::ash(), output }), GSA_KM2)
}

#[test]
fn test_model_output_must_be_probabilities() {
    let input = random_tensor(2);
    let logits = Grid::from_fn(2, 2, |x, y| if (x, y) == (1, 0) { 3.5 } else { 0.2 });
    assert_eq!(fixed_engine(logits).segment(&input, 0.5), Err(SegmentationError::ProbabilityOutOfRange(3.5)));
    let negative = Grid::from_fn(2, 2, |x, _| if x == 0 { -0.1 } else { 0.9 });
    assert_eq!(fixed_engine(negative).segment(&input, 0.5), Err(SegmentationError::ProbabilityOutOfRange(-0.1)));
    let nan = Grid::new(2, 2, f32::NAN);
    assert_eq!(fixed_engine(nan).segment(&input, 0.5), Err(SegmentationError::NonFiniteOutput));

    let bounds = Grid::from_fn(2, 2, |x, _| if x == 0 { 0.0 } else { 1.0 });
    let mask = fixed_engine(bounds).segment(&input, 0.5).unwrap();
    assert_eq!(mask.pixel_count(), 2);
}

#[test]
fn test_empty_mask_has_zero_intensity() {
    let mask = ContrailMask::from_probability(Grid::new(3, 3, 0.1), 0.5, GSA_KM2);
    assert_eq!(mask.pixel_count(), 0);
    assert!(mask.intensity().abs() < f64::EPSILON);
    assert!(mask.area_km2().abs() < f64::EPSILON);
}

#[test]
fn test_model_weights_round_trip() {
    let model = ConvSegmentationModel::reference(6, 9);
    let bytes = model.to_bytes().unwrap();
    let decoded = ConvSegmentationModel::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, model);
    assert_eq!(decoded.input_shape(), InputShape { channels: 3, height: 6, width: 9 });

    assert!(matches!(ConvSegmentationModel::from_bytes(&[0xff, 0x01]), Err(ModelError::Decode(_))));
}

#[test]
fn test_inconsistent_weights_are_rejected() {
    let shape = InputShape { channels: 3, height: 4, width: 4 };
    let too_few = ConvSegmentationModel::new(shape, InputRecipe::ash(), vec![[0.0; 9]], 0.0);
    assert!(matches!(too_few, Err(ModelError::Inconsistent(_))));
    let nan = ConvSegmentationModel::new(shape, InputRecipe::ash(), vec![[f32::NAN; 9]; 3], 0.0);
    assert!(matches!(nan, Err(ModelError::Inconsistent(_))));
}

#[tokio::test]
async fn test_blocking_segmentation_matches_sync() {
    let engine = reference_engine(8);
    let stack = line_stack(8, 2);
    let sync = engine.segment_bands(&stack, 0.5).unwrap();
    let blocking = engine.segment_blocking(Arc::new(stack), 0.5).await.unwrap();
    assert_eq!(sync, blocking);
}
