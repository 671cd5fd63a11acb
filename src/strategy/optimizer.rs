use super::{
    AltitudeChoice, AltitudeRange, Baseline, GridCell, GridCompleteness, Recommendation,
    StrategyGrid, StrategyOutcome,
};
use crate::config::MarketId;
use crate::emission::{EmissionError, EmissionModel, EmissionResult};
use crate::market::{CarbonMarketEngine, MarketError};
use crate::{event, warn};
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Failures of the grid search.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The altitude range is malformed.
    InvalidRange(&'static str),
    /// A grid altitude lies outside the configured cruise band.
    OutsideCruiseBand(u32),
    /// No market was selected.
    NoMarkets,
    /// A grid cell could not be evaluated.
    Emission(EmissionError),
    /// A grid cell could not be priced.
    Market(MarketError),
    /// A worker task panicked.
    Aborted,
}

impl Display for StrategyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::InvalidRange(why) => write!(f, "invalid altitude range: {why}"),
            StrategyError::OutsideCruiseBand(a) => write!(f, "altitude {a} m lies outside the cruise band"),
            StrategyError::NoMarkets => write!(f, "no market selected for the grid search"),
            StrategyError::Emission(e) => write!(f, "{e}"),
            StrategyError::Market(e) => write!(f, "{e}"),
            StrategyError::Aborted => write!(f, "grid worker aborted"),
        }
    }
}

impl std::error::Error for StrategyError {}

impl From<EmissionError> for StrategyError {
    fn from(value: EmissionError) -> Self { StrategyError::Emission(value) }
}

impl From<MarketError> for StrategyError {
    fn from(value: MarketError) -> Self { StrategyError::Market(value) }
}

type Row = (u32, Vec<GridCell>);

/// Evaluates the emission model and the market engine over an altitude x market grid.
///
/// Rows (one altitude, every market) are independent, so the async variants spread them
/// over a fixed number of blocking workers. Aggregation only starts once every worker
/// has returned.
#[derive(Debug, Clone)]
pub struct StrategyOptimizer {
    emission: EmissionModel,
    market: CarbonMarketEngine,
}

impl StrategyOptimizer {
    pub fn new(emission: EmissionModel, market: CarbonMarketEngine) -> Self { Self { emission, market } }

    /// Validates the request and returns the de-duplicated market list in selection order.
    fn prepare(&self, range: &AltitudeRange, markets: &[MarketId]) -> Result<Vec<MarketId>, StrategyError> {
        range.check_within(&self.emission.config().cruise_band)?;
        if markets.is_empty() {
            return Err(StrategyError::NoMarkets);
        }
        let markets = markets.iter().copied().unique().collect_vec();
        for m in &markets {
            if self.emission.config().market_profile(*m).is_none() {
                return Err(MarketError::UnknownMarket(m.to_string()).into());
            }
        }
        Ok(markets)
    }

    fn evaluate_row(&self, base: &EmissionResult, altitude_m: u32, markets: &[MarketId]) -> Result<Row, StrategyError> {
        let emission = self.emission.evaluate_at_altitude(base, altitude_m)?;
        let cells = markets
            .iter()
            .map(|m| {
                let quote = self.market.quote_id(&emission, *m)?;
                Ok(GridCell::new(altitude_m, emission.clone(), quote))
            })
            .collect::<Result<Vec<_>, StrategyError>>()?;
        event!("Grid row {altitude_m} m: {} kg CO2-eq", emission.co2_total_kg().round());
        Ok((altitude_m, cells))
    }

    /// Transposes altitude rows into per-market grids.
    fn assemble(rows: BTreeMap<u32, Vec<GridCell>>, markets: &[MarketId], total: usize) -> StrategyOutcome {
        let evaluated = rows.len();
        let mut columns: Vec<Vec<GridCell>> = markets.iter().map(|_| Vec::with_capacity(evaluated)).collect();
        for (_, row) in rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        let grids = markets
            .iter()
            .zip(columns)
            .filter_map(|(m, cells)| StrategyGrid::from_cells(*m, cells))
            .collect();
        let completeness = if evaluated == total {
            GridCompleteness::Complete
        } else {
            GridCompleteness::Partial { evaluated, total }
        };
        StrategyOutcome::new(grids, completeness)
    }

    /// Synchronous full grid search, altitudes ascending, markets in selection order.
    ///
    /// # Arguments
    /// * `base` - Template evaluation whose distance, airframe and contrail statistics are reused.
    /// * `range` - Altitudes to evaluate; must lie inside the cruise band.
    /// * `markets` - Markets to price, in reporting order.
    ///
    /// # Errors
    /// [`StrategyError`] for invalid ranges, unknown markets or failing cells.
    pub fn optimize(
        &self,
        base: &EmissionResult,
        range: &AltitudeRange,
        markets: &[MarketId],
    ) -> Result<StrategyOutcome, StrategyError> {
        let markets = self.prepare(range, markets)?;
        let rows = range
            .altitudes()
            .map(|a| self.evaluate_row(base, a, &markets))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self::assemble(rows, &markets, range.len()))
    }

    /// Grid search on blocking workers that stops picking up new rows once `cancel` fires.
    ///
    /// # Returns
    /// All evaluated rows; the outcome is tagged [`GridCompleteness::Partial`] if the token
    /// cut the search short.
    ///
    /// # Errors
    /// See [`StrategyOptimizer::optimize`]; [`StrategyError::Aborted`] if a worker panicked.
    pub async fn optimize_cancellable(
        &self,
        base: &EmissionResult,
        range: &AltitudeRange,
        markets: &[MarketId],
        cancel: CancellationToken,
    ) -> Result<StrategyOutcome, StrategyError> {
        let markets: Arc<[MarketId]> = self.prepare(range, markets)?.into();
        let altitudes: Arc<[u32]> = range.altitudes().collect();
        let base = Arc::new(base.clone());
        let next = Arc::new(AtomicUsize::new(0));
        let workers = std::thread::available_parallelism().map_or(2, usize::from).min(altitudes.len());

        let mut set = JoinSet::new();
        for _ in 0..workers {
            let (this, base, markets, altitudes, next, cancel) = (
                self.clone(),
                Arc::clone(&base),
                Arc::clone(&markets),
                Arc::clone(&altitudes),
                Arc::clone(&next),
                cancel.clone(),
            );
            set.spawn_blocking(move || {
                let mut rows = Vec::new();
                while !cancel.is_cancelled() {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(altitude) = altitudes.get(i) else { break };
                    rows.push(this.evaluate_row(&base, *altitude, &markets)?);
                }
                Ok::<_, StrategyError>(rows)
            });
        }

        let mut rows = BTreeMap::new();
        let mut first_err = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(found)) => rows.extend(found),
                Ok(Err(e)) => {
                    cancel.cancel();
                    first_err.get_or_insert(e);
                }
                Err(_) => {
                    cancel.cancel();
                    first_err.get_or_insert(StrategyError::Aborted);
                }
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        let outcome = Self::assemble(rows, &markets, altitudes.len());
        if let GridCompleteness::Partial { evaluated, total } = outcome.completeness() {
            warn!("Grid search cut short: {evaluated}/{total} altitude rows evaluated");
        }
        Ok(outcome)
    }

    /// [`StrategyOptimizer::optimize_cancellable`] with a wall-clock budget.
    ///
    /// # Errors
    /// See [`StrategyOptimizer::optimize_cancellable`].
    pub async fn optimize_with_deadline(
        &self,
        base: &EmissionResult,
        range: &AltitudeRange,
        markets: &[MarketId],
        timeout: Duration,
    ) -> Result<StrategyOutcome, StrategyError> {
        let cancel = CancellationToken::new();
        let watchdog = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::timeout(timeout, watchdog.cancelled()).await.ok().unwrap_or(());
            watchdog.cancel();
        });
        let res = self.optimize_cancellable(base, range, markets, cancel.clone()).await;
        cancel.cancel();
        timer.await.ok();
        res
    }

    /// Prices the current configuration and compares it with the grid's optimum.
    ///
    /// # Arguments
    /// * `outcome` - Grid search result; receives the recommendation.
    /// * `base` - The template the grid was evaluated from.
    /// * `current_market` - The market the operator reports under.
    /// * `current_altitude_m` - The flown cruise altitude, evaluated explicitly even if it is
    ///   not a grid point.
    ///
    /// # Errors
    /// [`StrategyError::OutsideCruiseBand`] or pricing errors.
    pub fn recommend(
        &self,
        outcome: &mut StrategyOutcome,
        base: &EmissionResult,
        current_market: MarketId,
        current_altitude_m: u32,
    ) -> Result<Recommendation, StrategyError> {
        if !self.emission.config().cruise_band.contains(current_altitude_m) {
            return Err(StrategyError::OutsideCruiseBand(current_altitude_m));
        }
        let current = self.emission.evaluate_at_altitude(base, current_altitude_m)?;
        let baseline = Baseline {
            altitude_m: current_altitude_m,
            market: current_market,
            cost: self.market.quote_id(&current, current_market)?.total_cost(),
        };
        let best_altitude = outcome.grid(current_market).and_then(StrategyGrid::optimal).map(|c| AltitudeChoice {
            altitude_m: c.altitude_m(),
            market: current_market,
            cost: c.cost(),
        });
        let grid_markets = outcome.grids().iter().map(StrategyGrid::market).collect_vec();
        let selection = if grid_markets.is_empty() { vec![current_market] } else { grid_markets };
        let comparison = self.market.compare_markets(&current, &selection)?;
        let best_market = comparison
            .cheapest()
            .map(|q| AltitudeChoice { altitude_m: current_altitude_m, market: q.market(), cost: q.total_cost() })
            .ok_or(StrategyError::NoMarkets)?;
        let recommendation = Recommendation { baseline, best_altitude, best_market };
        outcome.set_recommendation(recommendation);
        Ok(recommendation)
    }
}
