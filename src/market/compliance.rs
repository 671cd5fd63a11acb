use super::{CarbonMarketEngine, MarketError};
use crate::config::MarketId;
use serde::{Deserialize, Serialize};

/// An operator's yearly emission balance on one market. Quantities in tonnes, cost in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualCompliance {
    pub market: MarketId,
    pub total_emissions_t: f64,
    pub free_allowance_t: f64,
    pub owned_credits_t: f64,
    /// Emissions not covered by free allowance or owned credits.
    pub deficit_t: f64,
    pub price_per_tonne: f64,
    pub compliance_cost: f64,
}

impl AnnualCompliance {
    pub fn needs_purchase(&self) -> bool { self.deficit_t > 0.0 }
}

/// Split of a deficit between market allowances and cheaper offset credits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchasePlan {
    pub allowances_t: f64,
    pub credits_t: f64,
    pub total_cost: f64,
    /// Saving against covering the whole deficit with allowances.
    pub savings: f64,
}

impl PurchasePlan {
    /// Blended USD per tonne, `0.0` for an empty deficit.
    pub fn average_price(&self) -> f64 {
        let tonnes = self.allowances_t + self.credits_t;
        if tonnes > 0.0 { self.total_cost / tonnes } else { 0.0 }
    }

    pub fn uses_credits(&self) -> bool { self.credits_t > 0.0 }
}

/// Projected price and cost of one future year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostForecast {
    /// Years after the current one, starting at 1.
    pub year_offset: u32,
    pub price_per_tonne: f64,
    pub total_cost: f64,
    /// Increase over today's cost in percent.
    pub increase_pct: f64,
}

fn non_negative(v: f64, what: &'static str) -> Result<f64, MarketError> {
    if v.is_finite() && v >= 0.0 { Ok(v) } else { Err(MarketError::InvalidInput(what)) }
}

impl CarbonMarketEngine {
    /// Computes the yearly deficit `max(0, emissions - free allowance - owned credits)` and its cost.
    ///
    /// # Errors
    /// [`MarketError::UnknownMarket`] or [`MarketError::InvalidInput`] for negative quantities.
    pub fn annual_compliance(
        &self,
        market: MarketId,
        total_emissions_t: f64,
        free_allowance_t: f64,
        owned_credits_t: f64,
    ) -> Result<AnnualCompliance, MarketError> {
        let price = self.profile(market)?.price_per_tonne();
        let total_emissions_t = non_negative(total_emissions_t, "annual emissions")?;
        let free_allowance_t = non_negative(free_allowance_t, "free allowance")?;
        let owned_credits_t = non_negative(owned_credits_t, "owned credits")?;
        let deficit_t = (total_emissions_t - free_allowance_t - owned_credits_t).max(0.0);
        Ok(AnnualCompliance {
            market,
            total_emissions_t,
            free_allowance_t,
            owned_credits_t,
            deficit_t,
            price_per_tonne: price,
            compliance_cost: deficit_t * price,
        })
    }

    /// Covers `deficit_t` with the market's allowances, substituting up to
    /// `credit_limit_ratio * deficit_t` offset credits when they are cheaper.
    ///
    /// # Errors
    /// [`MarketError::InvalidInput`] if `credit_limit_ratio` is outside `[0, 1]` or an amount is negative.
    pub fn purchase_strategy(
        &self,
        market: MarketId,
        deficit_t: f64,
        credit_price: f64,
        credit_limit_ratio: f64,
    ) -> Result<PurchasePlan, MarketError> {
        let allowance_price = self.profile(market)?.price_per_tonne();
        let deficit_t = non_negative(deficit_t, "deficit")?;
        let credit_price = non_negative(credit_price, "credit price")?;
        if !(0.0..=1.0).contains(&credit_limit_ratio) {
            return Err(MarketError::InvalidInput("credit limit ratio"));
        }
        let credits_t = if credit_price < allowance_price { deficit_t * credit_limit_ratio } else { 0.0 };
        let allowances_t = deficit_t - credits_t;
        let total_cost = allowances_t * allowance_price + credits_t * credit_price;
        Ok(PurchasePlan {
            allowances_t,
            credits_t,
            total_cost,
            savings: deficit_t * allowance_price - total_cost,
        })
    }

    /// Projects the cost of a constant yearly emission under geometric price growth.
    ///
    /// # Returns
    /// One entry per year `1..=years`.
    ///
    /// # Errors
    /// [`MarketError::InvalidInput`] if the growth rate is below -100 % or not finite.
    pub fn forecast(
        &self,
        market: MarketId,
        annual_emissions_t: f64,
        annual_growth_rate: f64,
        years: u32,
    ) -> Result<Vec<CostForecast>, MarketError> {
        let price = self.profile(market)?.price_per_tonne();
        let annual_emissions_t = non_negative(annual_emissions_t, "annual emissions")?;
        if !(annual_growth_rate.is_finite() && annual_growth_rate > -1.0) {
            return Err(MarketError::InvalidInput("growth rate"));
        }
        let today = annual_emissions_t * price;
        Ok((1..=years)
            .map(|year_offset| {
                let future_price = price * (1.0 + annual_growth_rate).powf(f64::from(year_offset));
                let total_cost = annual_emissions_t * future_price;
                let increase_pct = if today > 0.0 { (total_cost / today - 1.0) * 100.0 } else { 0.0 };
                CostForecast { year_offset, price_per_tonne: future_price, total_cost, increase_pct }
            })
            .collect())
    }
}
