use super::{
    AnalysisReport, AnalysisRequest, AnalysisResponse, MatchPolicy, MatchSummary, PipelineStage,
    StageTrace, StrategyRequest,
};
use crate::config::{CoreConfig, MarketId};
use crate::emission::{EmissionError, EmissionModel, EmissionResult};
use crate::market::{CarbonMarketEngine, MarketComparison, MarketError};
use crate::matching::{GeoTimeMatcher, MatchError, SatelliteScene, SceneMatch};
use crate::segmentation::{SegmentationEngine, SegmentationError, SegmentationModel};
use crate::strategy::{AltitudeRange, StrategyError, StrategyGrid, StrategyOptimizer, StrategyOutcome};
use crate::util::GeoBoundsError;
use crate::{error, info, warn};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// The single error type surfaced to callers of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Pairing failed; [`MatchError::NoMatch`] is the recoverable case.
    Match(MatchError),
    Segmentation(SegmentationError),
    Emission(EmissionError),
    Market(MarketError),
    Strategy(StrategyError),
    /// The request's region of interest is malformed.
    InvalidBounds(GeoBoundsError),
    /// Internal stage bookkeeping went wrong.
    IllegalTransition { from: PipelineStage, to: PipelineStage },
}

impl AnalysisError {
    /// Only a missing pairing may be downgraded by the caller.
    pub fn is_recoverable(&self) -> bool { matches!(self, AnalysisError::Match(MatchError::NoMatch(_))) }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Match(e) => write!(f, "matching failed: {e}"),
            AnalysisError::Segmentation(e) => write!(f, "segmentation failed: {e}"),
            AnalysisError::Emission(e) => write!(f, "emission evaluation failed: {e}"),
            AnalysisError::Market(e) => write!(f, "pricing failed: {e}"),
            AnalysisError::Strategy(e) => write!(f, "strategy search failed: {e}"),
            AnalysisError::InvalidBounds(e) => write!(f, "invalid region of interest: {e}"),
            AnalysisError::IllegalTransition { from, to } => {
                write!(f, "illegal stage transition {from} -> {to}")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<MatchError> for AnalysisError {
    fn from(value: MatchError) -> Self { AnalysisError::Match(value) }
}

impl From<SegmentationError> for AnalysisError {
    fn from(value: SegmentationError) -> Self { AnalysisError::Segmentation(value) }
}

impl From<EmissionError> for AnalysisError {
    fn from(value: EmissionError) -> Self { AnalysisError::Emission(value) }
}

impl From<MarketError> for AnalysisError {
    fn from(value: MarketError) -> Self { AnalysisError::Market(value) }
}

impl From<StrategyError> for AnalysisError {
    fn from(value: StrategyError) -> Self { AnalysisError::Strategy(value) }
}

impl From<(PipelineStage, PipelineStage)> for AnalysisError {
    fn from((from, to): (PipelineStage, PipelineStage)) -> Self { AnalysisError::IllegalTransition { from, to } }
}

/// Entry point of the analysis core.
///
/// Holds only read-only shared state (configuration, model weights), so one pipeline can
/// serve concurrent requests.
#[derive(Clone)]
pub struct AnalysisPipeline {
    config: Arc<CoreConfig>,
    matcher: GeoTimeMatcher,
    segmentation: SegmentationEngine,
    emission: EmissionModel,
    market: CarbonMarketEngine,
    optimizer: StrategyOptimizer,
}

impl AnalysisPipeline {
    pub fn new(config: Arc<CoreConfig>, model: Arc<dyn SegmentationModel>) -> Self {
        let emission = EmissionModel::new(Arc::clone(&config));
        let market = CarbonMarketEngine::new(Arc::clone(&config));
        Self {
            matcher: GeoTimeMatcher::new(config.match_tolerance()),
            segmentation: SegmentationEngine::new(model, config.ground_sample_area_km2),
            optimizer: StrategyOptimizer::new(emission.clone(), market.clone()),
            emission,
            market,
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig { &self.config }

    /// Runs one request through every stage.
    ///
    /// # Returns
    /// A complete report, or [`AnalysisResponse::Unmatched`] if no scene pairs with the flight
    /// and the request allows flight-less completion.
    ///
    /// # Errors
    /// The first failing stage's error, mapped into [`AnalysisError`].
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        let mut trace = StageTrace::new(request.flight.callsign());
        let res = self.run(&request, &mut trace).await;
        if let Err(e) = &res {
            trace.fail(e.to_string());
            error!("Analysis of {} failed: {e}", request.flight.callsign());
        }
        res
    }

    async fn run(&self, request: &AnalysisRequest, trace: &mut StageTrace) -> Result<AnalysisResponse, AnalysisError> {
        let flight = &request.flight;
        flight.validate().map_err(|e| MatchError::InvalidTrack(flight.callsign().to_string(), e))?;

        let (scene, scene_match) = match self.select_scene(request)? {
            Some(found) => found,
            None => {
                trace.advance(PipelineStage::Unmatched)?;
                let warning = format!("no scene within tolerance of flight {}", flight.callsign());
                warn!("{warning}; continuing flight-less");
                return Ok(AnalysisResponse::Unmatched { flight_id: flight.callsign().to_string(), warning });
            }
        };
        trace.advance(PipelineStage::Matched)?;

        let mask = self.segmentation.segment_blocking(Arc::new(scene.bands().clone()), request.threshold).await?;
        let mask_stats = mask.stats();
        trace.advance(PipelineStage::Segmented)?;

        let emission = self.emission.evaluate_track(flight, mask_stats.into())?;
        trace.advance(PipelineStage::EmissionComputed)?;

        let quote = self.market.quote(&emission, &request.market)?;
        let comparison = self.compare_markets(&emission, &request.compare_markets)?;
        trace.advance(PipelineStage::Priced)?;

        let strategy = match &request.strategy {
            Some(settings) => {
                let outcome = self.evaluate_strategy(&emission, quote.market(), flight.cruise_altitude_m(), settings).await?;
                trace.advance(PipelineStage::StrategyEvaluated)?;
                Some(outcome)
            }
            None => None,
        };
        trace.advance(PipelineStage::Completed)?;

        info!(
            "{} over {}: {:.1} kg CO2-eq ({:.1} % contrail), {:.2} USD on {}",
            flight.callsign(),
            scene.id(),
            emission.co2_total_kg(),
            emission.contrail_share() * 100.0,
            quote.total_cost(),
            quote.market()
        );
        Ok(AnalysisResponse::Completed(Box::new(AnalysisReport {
            scene_id: scene.id().to_string(),
            flight_id: flight.callsign().to_string(),
            scene_match: scene_match.as_ref().map(MatchSummary::from),
            mask: mask_stats,
            cost_per_passenger: request.passengers.and_then(|p| quote.cost_per_passenger(p)),
            emission,
            quote,
            comparison,
            strategy,
            stages: trace.stages().to_vec(),
        })))
    }

    /// Picks the scene to analyse under the request's policy.
    ///
    /// `Ok(None)` means no pairing under [`MatchPolicy::AllowFlightLess`].
    fn select_scene<'a>(
        &self,
        request: &'a AnalysisRequest,
    ) -> Result<Option<(&'a SatelliteScene, Option<SceneMatch>)>, AnalysisError> {
        if let Some(bounds) = &request.bounds {
            bounds.validate().map_err(AnalysisError::InvalidBounds)?;
        }
        let candidates: Vec<&SatelliteScene> = request
            .scenes
            .iter()
            .filter(|s| request.bounds.is_none_or(|b| b.intersects(s.footprint())))
            .collect();

        if request.match_policy == MatchPolicy::Skip {
            let scene = *candidates
                .first()
                .ok_or_else(|| MatchError::NoMatch(String::from("<none>")))?;
            scene.validate().map_err(|e| MatchError::InvalidScene(scene.id().to_string(), e))?;
            return Ok(Some((scene, None)));
        }

        match self.matcher.best_scene_for(candidates.iter().copied(), &request.flight) {
            Ok((index, found)) => Ok(Some((candidates[index], Some(found)))),
            Err(MatchError::NoMatch(_)) if request.match_policy == MatchPolicy::AllowFlightLess => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_markets(&self, markets: &[String]) -> Result<Vec<MarketId>, MarketError> {
        if markets.is_empty() {
            return Ok(self.market.market_ids());
        }
        markets.iter().map(|m| self.market.resolve(m)).collect()
    }

    /// Prices `emission` on the named markets (all configured ones for an empty list).
    ///
    /// # Errors
    /// [`AnalysisError::Market`] naming the first unknown identifier.
    pub fn compare_markets(&self, emission: &EmissionResult, markets: &[String]) -> Result<MarketComparison, AnalysisError> {
        let ids = self.resolve_markets(markets)?;
        Ok(self.market.compare_markets(emission, &ids)?)
    }

    /// Full, synchronous grid search over `range` and the named markets.
    ///
    /// # Errors
    /// [`AnalysisError::Market`] for unknown identifiers, [`AnalysisError::Strategy`] otherwise.
    pub fn optimize_strategy(
        &self,
        base: &EmissionResult,
        range: &AltitudeRange,
        markets: &[String],
    ) -> Result<Vec<StrategyGrid>, AnalysisError> {
        let ids = self.resolve_markets(markets)?;
        Ok(self.optimizer.optimize(base, range, &ids)?.into_grids())
    }

    async fn evaluate_strategy(
        &self,
        base: &EmissionResult,
        current_market: MarketId,
        cruise_altitude_m: Option<u32>,
        settings: &StrategyRequest,
    ) -> Result<StrategyOutcome, AnalysisError> {
        let markets = self.resolve_markets(&settings.markets)?;
        let range = &settings.altitude_range;
        let mut outcome = match settings.deadline_ms {
            Some(ms) => {
                self.optimizer.optimize_with_deadline(base, range, &markets, Duration::from_millis(ms)).await?
            }
            None => self.optimizer.optimize_cancellable(base, range, &markets, CancellationToken::new()).await?,
        };
        let band = self.config.cruise_band;
        let current_altitude = cruise_altitude_m.map_or(band.min_m(), |a| a.clamp(band.min_m(), band.max_m()));
        self.optimizer.recommend(&mut outcome, base, current_market, current_altitude)?;
        Ok(outcome)
    }
}
