use crate::config::{CoreConfig, MarketId, MarketProfile};
use crate::emission::EmissionResult;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

/// Pricing failures.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketError {
    /// The identifier is not a known market or the market is not configured.
    UnknownMarket(String),
    /// A comparison was requested over an empty market selection.
    NoMarkets,
    /// A quantity handed to the engine is negative or not finite.
    InvalidInput(&'static str),
}

impl Display for MarketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketError::UnknownMarket(m) => write!(f, "unknown carbon market {m}"),
            MarketError::NoMarkets => write!(f, "no carbon market selected"),
            MarketError::InvalidInput(what) => write!(f, "invalid {what}"),
        }
    }
}

impl std::error::Error for MarketError {}

/// Price of one emission total on one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    market: MarketId,
    name: String,
    /// Currency the market trades in; every amount here is in [`MarketQuote::CURRENCY`].
    native_currency: String,
    /// USD per tonne CO2-equivalent.
    price_per_tonne: f64,
    co2_tonnes: f64,
    /// USD
    total_cost: f64,
    /// USD per flown km.
    cost_per_km: f64,
}

impl MarketQuote {
    /// Currency of every price and cost figure.
    pub const CURRENCY: &'static str = "USD";

    pub fn market(&self) -> MarketId { self.market }
    pub fn name(&self) -> &str { &self.name }
    pub fn native_currency(&self) -> &str { &self.native_currency }
    pub fn price_per_tonne(&self) -> f64 { self.price_per_tonne }
    pub fn co2_tonnes(&self) -> f64 { self.co2_tonnes }
    pub fn total_cost(&self) -> f64 { self.total_cost }
    pub fn cost_per_km(&self) -> f64 { self.cost_per_km }

    /// Cost share of a single passenger, `None` for an empty cabin.
    pub fn cost_per_passenger(&self, passengers: u32) -> Option<f64> {
        (passengers > 0).then(|| self.total_cost / f64::from(passengers))
    }
}

/// Quotes for several markets, sorted by ascending total cost.
///
/// Ratio and spread are always derived from the quotes, never stored next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    quotes: Vec<MarketQuote>,
}

impl MarketComparison {
    pub fn quotes(&self) -> &[MarketQuote] { &self.quotes }

    pub fn into_quotes(self) -> Vec<MarketQuote> { self.quotes }

    pub fn cheapest(&self) -> Option<&MarketQuote> { self.quotes.first() }

    pub fn most_expensive(&self) -> Option<&MarketQuote> { self.quotes.last() }

    /// `max / min` total cost; `None` if the cheapest quote is free.
    pub fn ratio(&self) -> Option<f64> {
        let (min, max) = (self.cheapest()?.total_cost, self.most_expensive()?.total_cost);
        (min > 0.0).then(|| max / min)
    }

    /// Absolute difference between the most expensive and cheapest quote in USD.
    pub fn spread(&self) -> f64 {
        match (self.cheapest(), self.most_expensive()) {
            (Some(min), Some(max)) => max.total_cost - min.total_cost,
            _ => 0.0,
        }
    }
}

/// Prices CO2-equivalent totals on the configured markets.
#[derive(Debug, Clone)]
pub struct CarbonMarketEngine {
    config: Arc<CoreConfig>,
}

impl CarbonMarketEngine {
    const KG_PER_TONNE: f64 = 1000.0;

    pub fn new(config: Arc<CoreConfig>) -> Self { Self { config } }

    /// Configured market identifiers in evaluation order.
    pub fn market_ids(&self) -> Vec<MarketId> { self.config.market_ids() }

    /// Parses and checks a market identifier such as `"EU_ETS"`.
    ///
    /// # Errors
    /// [`MarketError::UnknownMarket`] carrying the raw identifier.
    pub fn resolve(&self, raw: &str) -> Result<MarketId, MarketError> {
        let id = raw.trim().parse::<MarketId>().map_err(|_| MarketError::UnknownMarket(raw.to_string()))?;
        self.profile(id).map(MarketProfile::id)
    }

    pub(super) fn profile(&self, market: MarketId) -> Result<&MarketProfile, MarketError> {
        self.config.market_profile(market).ok_or_else(|| MarketError::UnknownMarket(market.to_string()))
    }

    /// Prices a raw CO2-equivalent mass.
    ///
    /// # Arguments
    /// * `market` - A configured market.
    /// * `co2_kg` - Total CO2-equivalent in kg.
    /// * `distance_km` - Flown distance used for the per-km figure.
    ///
    /// # Errors
    /// [`MarketError::UnknownMarket`] or [`MarketError::InvalidInput`].
    pub fn quote_mass(&self, market: MarketId, co2_kg: f64, distance_km: f64) -> Result<MarketQuote, MarketError> {
        if !(co2_kg.is_finite() && co2_kg >= 0.0) {
            return Err(MarketError::InvalidInput("CO2 mass"));
        }
        if !(distance_km.is_finite() && distance_km > 0.0) {
            return Err(MarketError::InvalidInput("distance"));
        }
        let profile = self.profile(market)?;
        let co2_tonnes = co2_kg / Self::KG_PER_TONNE;
        let total_cost = co2_tonnes * profile.price_per_tonne();
        Ok(MarketQuote {
            market,
            name: profile.name().to_string(),
            native_currency: profile.native_currency().to_string(),
            price_per_tonne: profile.price_per_tonne(),
            co2_tonnes,
            total_cost,
            cost_per_km: total_cost / distance_km,
        })
    }

    /// Prices an emission result on the market named by `market`.
    ///
    /// # Errors
    /// [`MarketError::UnknownMarket`] for identifiers like `"XX_ETS"`.
    pub fn quote(&self, emission: &EmissionResult, market: &str) -> Result<MarketQuote, MarketError> {
        self.quote_id(emission, self.resolve(market)?)
    }

    /// Like [`CarbonMarketEngine::quote`] for an already resolved identifier.
    ///
    /// # Errors
    /// See [`CarbonMarketEngine::quote_mass`].
    pub fn quote_id(&self, emission: &EmissionResult, market: MarketId) -> Result<MarketQuote, MarketError> {
        self.quote_mass(market, emission.co2_total_kg(), emission.distance_km())
    }

    /// Quotes `emission` on each selected market. Duplicates are priced once.
    ///
    /// # Returns
    /// Quotes sorted by ascending total cost; equal costs keep the selection order.
    ///
    /// # Errors
    /// [`MarketError::NoMarkets`] for an empty selection or the first pricing failure.
    pub fn compare_markets(&self, emission: &EmissionResult, markets: &[MarketId]) -> Result<MarketComparison, MarketError> {
        if markets.is_empty() {
            return Err(MarketError::NoMarkets);
        }
        let mut quotes = markets
            .iter()
            .unique()
            .map(|m| self.quote_id(emission, *m))
            .collect::<Result<Vec<_>, _>>()?;
        quotes.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost));
        Ok(MarketComparison { quotes })
    }

    /// [`CarbonMarketEngine::compare_markets`] over every configured market.
    ///
    /// # Errors
    /// [`MarketError::NoMarkets`] if no market is configured.
    pub fn compare_all(&self, emission: &EmissionResult) -> Result<MarketComparison, MarketError> {
        self.compare_markets(emission, &self.market_ids())
    }
}
