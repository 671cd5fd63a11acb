use super::{
    AircraftType, ConfigError, ContrailPropensityCurve, CoreConfig, CruiseBand,
    FuelAltitudeBands, MarketId,
};
use chrono::TimeDelta;
use itertools::Itertools;
use strum::IntoEnumIterator;

#[test]
fn test_default_config_is_valid() {
    let config = CoreConfig::default();
    assert_eq!(config.validate(), Ok(()));
    assert_eq!(config.aircraft.len(), AircraftType::iter().count());
    assert_eq!(config.market_ids(), MarketId::iter().collect::<Vec<_>>());
    assert_eq!(config.match_tolerance().num_seconds(), 900);
}

#[test]
fn test_reference_constants() {
    let config = CoreConfig::default();
    let a320 = config.aircraft_profile(AircraftType::A320).unwrap();
    assert!((a320.fuel_burn_cruise() - 3.0).abs() < f64::EPSILON);
    assert!((config.combustion_factor - 3.16).abs() < f64::EPSILON);
    assert!((config.contrail_forcing.co2_eq_per_km2() - 112.5).abs() < 1e-9);
    let eu = config.market_profile(MarketId::EuEts).unwrap();
    assert!((eu.price_per_tonne() - 95.0).abs() < f64::EPSILON);
    assert_eq!(eu.name(), "EU Emissions Trading System");
}

#[test]
fn test_aircraft_designator_resolution() {
    let cases = [
        ("A320", AircraftType::A320),
        ("a320-214", AircraftType::A320),
        (" b737-800 ", AircraftType::B737_800),
        ("B737-824", AircraftType::B737_800),
        ("B737-9", AircraftType::B737_900),
        ("B777-300", AircraftType::B777_300ER),
        ("A380-841", AircraftType::A380),
        ("B787-9", AircraftType::B787_9),
    ];
    for (raw, expected) in cases {
        assert_eq!(raw.parse::<AircraftType>(), Ok(expected), "{raw}");
    }
    assert_eq!("C919".parse::<AircraftType>(), Err(String::from("C919")));
    assert_eq!("b737-7".parse::<AircraftType>(), Err(String::from("B737-7")));
    assert!("".parse::<AircraftType>().is_err());
}

#[test]
fn test_every_designator_round_trips() {
    for aircraft in AircraftType::iter() {
        assert_eq!(aircraft.designator().parse::<AircraftType>(), Ok(aircraft));
    }
}

#[test]
fn test_market_identifiers() {
    assert_eq!("EU_ETS".parse::<MarketId>(), Ok(MarketId::EuEts));
    assert_eq!("uk_ets".parse::<MarketId>(), Ok(MarketId::UkEts));
    assert!("XX_ETS".parse::<MarketId>().is_err());
    assert_eq!(MarketId::California.to_string(), "CALIFORNIA");
}

#[test]
fn test_propensity_is_monotone_and_anchored() {
    let curve = ContrailPropensityCurve::default();
    assert!((curve.multiplier(10_000) - 1.0).abs() < 1e-12);
    assert!((curve.multiplier(5_000) - 0.94).abs() < 1e-12);
    assert!((curve.multiplier(20_000) - 1.09).abs() < 1e-12);
    let samples = (8_000..=13_000).step_by(250).map(|a| curve.multiplier(a)).collect_vec();
    assert!(samples.iter().tuple_windows().all(|(a, b)| a <= b));
}

#[test]
fn test_fuel_altitude_bands() {
    let bands = FuelAltitudeBands::default();
    assert!((bands.factor(9_500) - 0.85).abs() < f64::EPSILON);
    assert!((bands.factor(9_000) - 0.92).abs() < f64::EPSILON);
    assert!((bands.factor(6_000) - 1.10).abs() < f64::EPSILON);
    assert!((FuelAltitudeBands::neutral().factor(11_000) - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_validation_rejects_broken_tables() {
    let mut config = CoreConfig::default();
    config.ground_sample_area_km2 = 0.0;
    assert_eq!(config.validate(), Err(ConfigError::InvalidConstant("ground_sample_area_km2")));

    let mut config = CoreConfig::default();
    config.cruise_band = CruiseBand::new(12_000, 9_000);
    assert_eq!(config.validate(), Err(ConfigError::InvalidCruiseBand));

    let mut config = CoreConfig::default();
    config.propensity = ContrailPropensityCurve::new(vec![(8_000.0, 1.2), (12_000.0, 0.9)]);
    assert_eq!(config.validate(), Err(ConfigError::NonMonotonePropensity));

    let mut config = CoreConfig::default();
    config.propensity = ContrailPropensityCurve::new(vec![(8_000.0, 0.0), (12_000.0, 1.0)]);
    assert_eq!(config.validate(), Err(ConfigError::NonMonotonePropensity));

    let mut config = CoreConfig::default();
    config.markets.push(MarketId::Corsia.default_profile());
    assert_eq!(config.validate(), Err(ConfigError::DuplicateMarket(MarketId::Corsia)));

    let mut config = CoreConfig::default();
    config.markets[0] = MarketId::EuEts.default_profile().with_price(-1.0);
    assert_eq!(config.validate(), Err(ConfigError::InvalidMarket(MarketId::EuEts)));

    let mut config = CoreConfig::default();
    let broken = AircraftType::A321.default_profile().with_fuel_burn_cruise(f64::NAN);
    config.aircraft.insert(AircraftType::A321, broken);
    assert_eq!(config.validate(), Err(ConfigError::InvalidAircraft(AircraftType::A321)));
}

#[test]
fn test_unparsable_env_override() {
    // SAFETY: no other test reads this variable.
    unsafe { std::env::set_var("CONTRAIL_MATCH_TOLERANCE_SECS", "quarter-hour") };
    let res = CoreConfig::from_env();
    unsafe { std::env::remove_var("CONTRAIL_MATCH_TOLERANCE_SECS") };
    assert_eq!(res, Err(ConfigError::InvalidEnv(String::from("CONTRAIL_MATCH_TOLERANCE_SECS"))));

    // parses as i64 but does not fit a TimeDelta
    unsafe { std::env::set_var("CONTRAIL_MATCH_TOLERANCE_SECS", i64::MAX.to_string()) };
    let res = CoreConfig::from_env();
    unsafe { std::env::remove_var("CONTRAIL_MATCH_TOLERANCE_SECS") };
    assert_eq!(res, Err(ConfigError::InvalidConstant("match_tolerance_secs")));
}

#[test]
fn test_match_tolerance_bounds() {
    let mut config = CoreConfig::default();
    assert_eq!(config.match_tolerance(), TimeDelta::minutes(15));

    config.match_tolerance_secs = i64::MAX;
    assert_eq!(config.validate(), Err(ConfigError::InvalidConstant("match_tolerance_secs")));
    assert_eq!(config.match_tolerance(), TimeDelta::MAX);

    config.match_tolerance_secs = -1;
    assert_eq!(config.validate(), Err(ConfigError::InvalidConstant("match_tolerance_secs")));

    config.match_tolerance_secs = 86_400 * 365;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_aircraft_profiles_carry_cruise_and_species_factors() {
    for aircraft in AircraftType::iter() {
        let profile = aircraft.default_profile();
        assert_eq!(profile.aircraft(), aircraft);
        assert!(profile.fuel_burn_cruise() > 0.0);
        assert!((profile.ef_h2o() - 1.23).abs() < f64::EPSILON);
        assert!(profile.ef_nox() > profile.ef_soot());
    }
    let mut config = CoreConfig::default();
    config.aircraft.insert(AircraftType::B787_9, AircraftType::B787_9.default_profile().with_fuel_burn_cruise(0.0));
    assert_eq!(config.validate(), Err(ConfigError::InvalidAircraft(AircraftType::B787_9)));
}
