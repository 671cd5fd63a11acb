use super::{CarbonMarketEngine, MarketError, MarketQuote};
use crate::config::{CoreConfig, MarketId};
use crate::emission::{ContrailStats, EmissionModel, EmissionResult};
use itertools::Itertools;
use std::sync::Arc;
use strum::IntoEnumIterator;

fn config() -> Arc<CoreConfig> { Arc::new(CoreConfig::default()) }

fn engine() -> CarbonMarketEngine { CarbonMarketEngine::new(config()) }

fn emission(distance_km: f64) -> EmissionResult {
    EmissionModel::new(config()).evaluate("KLM643", distance_km, "B777-300ER", ContrailStats::none(64)).unwrap()
}

#[test]
fn test_eu_ets_reference_price() {
    let quote = engine().quote_mass(MarketId::EuEts, 2196.9, 1000.0).unwrap();
    assert!((quote.total_cost() - 208.7055).abs() < 1e-9);
    assert!((quote.co2_tonnes() - 2.1969).abs() < 1e-12);
    assert!((quote.cost_per_km() - 0.208_705_5).abs() < 1e-12);
    assert!((quote.price_per_tonne() - 95.0).abs() < f64::EPSILON);
    assert_eq!(quote.name(), "EU Emissions Trading System");
    // amounts stay in USD whatever the market trades in
    assert_eq!(quote.native_currency(), "EUR");
    assert_eq!(MarketQuote::CURRENCY, "USD");
}

#[test]
fn test_unknown_market() {
    let err = engine().quote(&emission(500.0), "XX_ETS").unwrap_err();
    assert_eq!(err, MarketError::UnknownMarket(String::from("XX_ETS")));

    let mut reduced = CoreConfig::default();
    reduced.markets.retain(|m| m.id() != MarketId::China);
    let engine = CarbonMarketEngine::new(Arc::new(reduced));
    assert_eq!(engine.resolve("china"), Err(MarketError::UnknownMarket(String::from("CHINA"))));
    assert_eq!(engine.resolve(" eu_ets "), Ok(MarketId::EuEts));
}

#[test]
fn test_quote_from_emission_result() {
    let e = emission(1000.0);
    let quote = engine().quote(&e, "CORSIA").unwrap();
    // 7.5 kg/km * 1000 km * 3.16 = 23.7 t at 20 USD
    assert!((quote.total_cost() - 474.0).abs() < 1e-9);
    assert!((quote.cost_per_passenger(300).unwrap() - 1.58).abs() < 1e-9);
    assert_eq!(quote.cost_per_passenger(0), None);
}

#[test]
fn test_comparison_is_sorted_with_derived_ratio() {
    let e = emission(2500.0);
    let cmp = engine().compare_all(&e).unwrap();
    assert_eq!(cmp.quotes().len(), MarketId::iter().count());
    assert!(cmp.quotes().iter().tuple_windows().all(|(a, b)| a.total_cost() <= b.total_cost()));
    assert_eq!(cmp.cheapest().unwrap().market(), MarketId::China);
    assert_eq!(cmp.most_expensive().unwrap().market(), MarketId::EuEts);

    let costs = cmp.quotes().iter().map(|q| q.total_cost()).collect_vec();
    let (min, max) = costs.iter().copied().minmax().into_option().unwrap();
    assert!((cmp.ratio().unwrap() - max / min).abs() < 1e-12);
    assert!((cmp.ratio().unwrap() - 95.0 / 11.0).abs() < 1e-9);
    assert!((cmp.spread() - (max - min)).abs() < 1e-9);
}

#[test]
fn test_comparison_selection() {
    let e = emission(800.0);
    let engine = engine();
    let cmp = engine.compare_markets(&e, &[MarketId::UkEts, MarketId::Corsia, MarketId::UkEts]).unwrap();
    assert_eq!(cmp.quotes().iter().map(|q| q.market()).collect_vec(), [MarketId::Corsia, MarketId::UkEts]);
    assert_eq!(engine.compare_markets(&e, &[]), Err(MarketError::NoMarkets));
}

#[test]
fn test_free_emissions_have_no_ratio() {
    let mut cfg = CoreConfig::default();
    cfg.markets = vec![MarketId::EuEts.default_profile().with_price(0.0), MarketId::Corsia.default_profile()];
    let engine = CarbonMarketEngine::new(Arc::new(cfg));
    let cmp = engine.compare_all(&emission(100.0)).unwrap();
    assert_eq!(cmp.ratio(), None);
    assert!(cmp.spread() > 0.0);
}

#[test]
fn test_invalid_quantities() {
    let engine = engine();
    assert_eq!(engine.quote_mass(MarketId::EuEts, -1.0, 10.0), Err(MarketError::InvalidInput("CO2 mass")));
    assert_eq!(engine.quote_mass(MarketId::EuEts, 1.0, 0.0), Err(MarketError::InvalidInput("distance")));
}

#[test]
fn test_annual_compliance() {
    let engine = engine();
    let c = engine.annual_compliance(MarketId::EuEts, 50_000.0, 30_000.0, 5_000.0).unwrap();
    assert!((c.deficit_t - 15_000.0).abs() < 1e-9);
    assert!((c.compliance_cost - 1_425_000.0).abs() < 1e-6);
    assert!(c.needs_purchase());

    let surplus = engine.annual_compliance(MarketId::EuEts, 10_000.0, 30_000.0, 0.0).unwrap();
    assert!(surplus.deficit_t.abs() < f64::EPSILON);
    assert!(!surplus.needs_purchase());
}

#[test]
fn test_purchase_strategy() {
    let engine = engine();
    let plan = engine.purchase_strategy(MarketId::EuEts, 1000.0, 15.0, 0.15).unwrap();
    assert!((plan.credits_t - 150.0).abs() < 1e-9);
    assert!((plan.allowances_t - 850.0).abs() < 1e-9);
    assert!((plan.savings - 150.0 * 80.0).abs() < 1e-6);
    assert!(plan.uses_credits());
    assert!(plan.average_price() < 95.0);

    let expensive = engine.purchase_strategy(MarketId::China, 1000.0, 15.0, 0.15).unwrap();
    assert!(!expensive.uses_credits());
    assert!(expensive.savings.abs() < f64::EPSILON);

    assert_eq!(
        engine.purchase_strategy(MarketId::EuEts, 1000.0, 15.0, 1.5),
        Err(MarketError::InvalidInput("credit limit ratio"))
    );
}

#[test]
fn test_cost_forecast() {
    let forecast = engine().forecast(MarketId::Corsia, 1000.0, 0.08, 5).unwrap();
    assert_eq!(forecast.len(), 5);
    assert_eq!(forecast[0].year_offset, 1);
    assert!((forecast[0].price_per_tonne - 21.6).abs() < 1e-9);
    assert!((forecast[0].increase_pct - 8.0).abs() < 1e-9);
    assert!(forecast.iter().tuple_windows().all(|(a, b)| a.total_cost < b.total_cost));
    assert!(engine().forecast(MarketId::Corsia, 1000.0, -1.0, 5).is_err());
}
