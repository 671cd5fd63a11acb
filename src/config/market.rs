use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The closed set of supported carbon markets.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum MarketId {
    #[strum(serialize = "EU_ETS")]
    EuEts,
    #[strum(serialize = "CORSIA")]
    Corsia,
    #[strum(serialize = "CHINA")]
    China,
    #[strum(serialize = "UK_ETS")]
    UkEts,
    #[strum(serialize = "CALIFORNIA")]
    California,
}

impl MarketId {
    /// Reference market data (2024 prices, converted to USD).
    pub fn default_profile(self) -> MarketProfile {
        let (name, price, native_currency, volatility) = match self {
            MarketId::EuEts => ("EU Emissions Trading System", 95.0, "EUR", 0.25),
            MarketId::Corsia => ("ICAO Carbon Offsetting Scheme", 20.0, "USD", 0.15),
            MarketId::China => ("China National Carbon Market", 11.0, "CNY", 0.20),
            MarketId::UkEts => ("UK Emissions Trading Scheme", 55.0, "GBP", 0.22),
            MarketId::California => ("California Cap-and-Trade", 32.0, "USD", 0.18),
        };
        MarketProfile {
            id: self,
            name: String::from(name),
            price_per_tonne: price,
            native_currency: String::from(native_currency),
            volatility,
        }
    }
}

/// Immutable pricing record of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Market identifier.
    id: MarketId,
    /// Human readable market name.
    name: String,
    /// Price per tonne CO2-equivalent in USD.
    price_per_tonne: f64,
    /// Currency the market trades in. Informational; prices are already in USD.
    native_currency: String,
    /// Annualised relative price volatility.
    volatility: f64,
}

impl MarketProfile {
    pub fn id(&self) -> MarketId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price_per_tonne(&self) -> f64 { self.price_per_tonne }
    pub fn native_currency(&self) -> &str { &self.native_currency }
    pub fn volatility(&self) -> f64 { self.volatility }

    /// Returns a copy with a different price, e.g. for a custom quote.
    pub fn with_price(mut self, price_per_tonne: f64) -> Self {
        self.price_per_tonne = price_per_tonne;
        self
    }

    pub(super) fn is_plausible(&self) -> bool {
        self.price_per_tonne.is_finite() && self.price_per_tonne >= 0.0 && self.volatility >= 0.0
    }
}
