use super::PipelineStage;
use crate::emission::EmissionResult;
use crate::market::{MarketComparison, MarketQuote};
use crate::matching::{FlightTrack, SatelliteScene, SceneMatch};
use crate::segmentation::MaskStats;
use crate::strategy::{AltitudeRange, StrategyOutcome};
use crate::util::BoundingBox;
use serde::{Deserialize, Serialize};

/// What to do when no scene pairs with the flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// A missing pairing fails the request.
    #[default]
    Require,
    /// A missing pairing ends the run as [`AnalysisResponse::Unmatched`].
    AllowFlightLess,
    /// Skip matching and analyse the first in-bounds scene.
    Skip,
}

/// Optional grid search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub altitude_range: AltitudeRange,
    /// Market identifiers; empty selects every configured market.
    pub markets: Vec<String>,
    /// Wall-clock budget; without one the grid is always complete.
    pub deadline_ms: Option<u64>,
}

/// Everything one analysis needs. Inputs are re-validated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Candidate scenes.
    pub scenes: Vec<SatelliteScene>,
    pub flight: FlightTrack,
    /// Region of interest; scenes outside it are ignored.
    pub bounds: Option<BoundingBox>,
    /// Detection threshold in `(0, 1)`.
    pub threshold: f32,
    /// Market to price under, e.g. `"EU_ETS"`.
    pub market: String,
    /// Markets for the side-by-side comparison; empty selects every configured market.
    pub compare_markets: Vec<String>,
    pub match_policy: MatchPolicy,
    pub passengers: Option<u32>,
    pub strategy: Option<StrategyRequest>,
}

impl AnalysisRequest {
    /// A request with default policy, every market compared and no grid search.
    pub fn new(
        scenes: Vec<SatelliteScene>,
        flight: FlightTrack,
        threshold: f32,
        market: impl Into<String>,
    ) -> Self {
        Self {
            scenes,
            flight,
            bounds: None,
            threshold,
            market: market.into(),
            compare_markets: Vec::new(),
            match_policy: MatchPolicy::default(),
            passengers: None,
            strategy: None,
        }
    }
}

/// Pairing details that leave the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub time_offset_secs: i64,
    pub overlap_ratio: f64,
    pub center_distance_km: f64,
}

impl From<&SceneMatch> for MatchSummary {
    fn from(value: &SceneMatch) -> Self {
        Self {
            time_offset_secs: value.time_offset().num_seconds(),
            overlap_ratio: value.overlap_ratio(),
            center_distance_km: value.center_distance_km(),
        }
    }
}

/// A fully analysed flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub scene_id: String,
    pub flight_id: String,
    /// `None` when matching was skipped.
    pub scene_match: Option<MatchSummary>,
    pub mask: MaskStats,
    pub emission: EmissionResult,
    pub quote: MarketQuote,
    pub cost_per_passenger: Option<f64>,
    pub comparison: MarketComparison,
    pub strategy: Option<StrategyOutcome>,
    /// Stages the run passed through, `Received` to `Completed`.
    pub stages: Vec<PipelineStage>,
}

/// Outcome of [`super::AnalysisPipeline::analyze`]. Never half populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisResponse {
    Completed(Box<AnalysisReport>),
    /// No scene paired with the flight and the policy allowed it.
    Unmatched { flight_id: String, warning: String },
}
