use crate::config::MarketId;
use crate::emission::EmissionResult;
use crate::market::MarketQuote;
use serde::{Deserialize, Serialize};

/// One evaluated (altitude, market) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    altitude_m: u32,
    emission: EmissionResult,
    quote: MarketQuote,
}

impl GridCell {
    pub(super) fn new(altitude_m: u32, emission: EmissionResult, quote: MarketQuote) -> Self {
        Self { altitude_m, emission, quote }
    }

    pub fn altitude_m(&self) -> u32 { self.altitude_m }
    pub fn emission(&self) -> &EmissionResult { &self.emission }
    pub fn quote(&self) -> &MarketQuote { &self.quote }
    pub fn market(&self) -> MarketId { self.quote.market() }

    /// Total cost in USD.
    pub fn cost(&self) -> f64 { self.quote.total_cost() }
}

/// All evaluated altitudes of one market. Altitudes are strictly ascending, each appears once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyGrid {
    market: MarketId,
    cells: Vec<GridCell>,
}

impl StrategyGrid {
    /// Wraps `cells`, or returns `None` if their altitudes are not strictly ascending
    /// or a cell belongs to another market.
    pub fn from_cells(market: MarketId, cells: Vec<GridCell>) -> Option<Self> {
        let ordered = cells.windows(2).all(|w| w[0].altitude_m < w[1].altitude_m);
        let same_market = cells.iter().all(|c| c.market() == market);
        (ordered && same_market).then_some(Self { market, cells })
    }

    pub fn market(&self) -> MarketId { self.market }
    pub fn cells(&self) -> &[GridCell] { &self.cells }
    pub fn len(&self) -> usize { self.cells.len() }
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    pub fn altitudes(&self) -> impl Iterator<Item = u32> + '_ { self.cells.iter().map(GridCell::altitude_m) }

    pub fn cell_at(&self, altitude_m: u32) -> Option<&GridCell> {
        self.cells
            .binary_search_by_key(&altitude_m, GridCell::altitude_m)
            .ok()
            .map(|i| &self.cells[i])
    }

    /// Cheapest cell; equal costs resolve to the lower altitude.
    pub fn optimal(&self) -> Option<&GridCell> {
        // min_by keeps the first of equal elements, cells are ascending in altitude
        self.cells.iter().min_by(|a, b| a.cost().total_cmp(&b.cost()))
    }
}

/// Whether every grid cell was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridCompleteness {
    Complete,
    /// The search was cut short; only `evaluated` of `total` altitude rows are present.
    Partial { evaluated: usize, total: usize },
}

/// The market chosen for one altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeChoice {
    pub altitude_m: u32,
    pub market: MarketId,
    /// USD
    pub cost: f64,
}

/// The configuration the flight actually used, priced explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub altitude_m: u32,
    pub market: MarketId,
    /// USD
    pub cost: f64,
}

/// Recommendations relative to the current configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub baseline: Baseline,
    /// Cheapest grid altitude on the current market, `None` if no row was evaluated.
    pub best_altitude: Option<AltitudeChoice>,
    /// Cheapest configured market at the current altitude.
    pub best_market: AltitudeChoice,
}

impl Recommendation {
    /// `best_altitude.cost - baseline.cost`; negative values are savings.
    pub fn altitude_delta(&self) -> Option<f64> { self.best_altitude.map(|c| c.cost - self.baseline.cost) }

    /// `best_market.cost - baseline.cost`; negative values are savings.
    pub fn market_delta(&self) -> f64 { self.best_market.cost - self.baseline.cost }
}

/// Result of a grid search: one grid per market in configured order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    grids: Vec<StrategyGrid>,
    completeness: GridCompleteness,
    recommendation: Option<Recommendation>,
}

impl StrategyOutcome {
    pub(super) fn new(grids: Vec<StrategyGrid>, completeness: GridCompleteness) -> Self {
        Self { grids, completeness, recommendation: None }
    }

    pub(super) fn set_recommendation(&mut self, recommendation: Recommendation) {
        self.recommendation = Some(recommendation);
    }

    pub fn grids(&self) -> &[StrategyGrid] { &self.grids }

    pub fn into_grids(self) -> Vec<StrategyGrid> { self.grids }

    pub fn completeness(&self) -> GridCompleteness { self.completeness }

    pub fn is_partial(&self) -> bool { matches!(self.completeness, GridCompleteness::Partial { .. }) }

    pub fn recommendation(&self) -> Option<&Recommendation> { self.recommendation.as_ref() }

    pub fn grid(&self, market: MarketId) -> Option<&StrategyGrid> { self.grids.iter().find(|g| g.market == market) }

    /// Per market, the cost-minimal cell.
    pub fn optimal_altitudes(&self) -> Vec<(MarketId, &GridCell)> {
        self.grids.iter().filter_map(|g| g.optimal().map(|c| (g.market, c))).collect()
    }

    /// Per evaluated altitude (ascending), the cheapest market. Equal costs keep the
    /// configured market order.
    pub fn optimal_markets(&self) -> Vec<AltitudeChoice> {
        let Some(first) = self.grids.first() else { return Vec::new() };
        first
            .altitudes()
            .filter_map(|altitude_m| {
                self.grids
                    .iter()
                    .filter_map(|g| g.cell_at(altitude_m))
                    .min_by(|a, b| a.cost().total_cmp(&b.cost()))
                    .map(|c| AltitudeChoice { altitude_m, market: c.market(), cost: c.cost() })
            })
            .collect()
    }
}
