use super::{ContrailStats, EmissionError, EmissionModel, FleetSummary};
use crate::config::{AircraftType, CoreConfig};
use crate::matching::{FlightTrack, TrackSample};
use crate::util::GeoPoint;
use chrono::{TimeDelta, TimeZone, Utc};
use itertools::Itertools;
use std::sync::Arc;

fn model() -> EmissionModel { EmissionModel::new(Arc::new(CoreConfig::default())) }

fn contrail(pixels: f64, intensity: f64) -> ContrailStats {
    ContrailStats { pixel_count: pixels, total_pixels: 1024, intensity }
}

#[test]
fn test_a320_reference_flight() {
    let res = model().evaluate("AFR1234", 1000.0, "A320", ContrailStats::none(1024)).unwrap();
    assert_eq!(res.aircraft(), AircraftType::A320);
    assert!((res.fuel_burn_kg() - 3000.0).abs() < 1e-9);
    assert!((res.co2_direct_kg() - 9480.0).abs() < 1e-9);
    assert!(res.co2_contrail_kg().abs() < f64::EPSILON);
    assert!((res.co2_total_kg() - 9480.0).abs() < 1e-9);
    assert!((res.emission_factor() - 9.48).abs() < 1e-12);
    assert!((res.species().nox_kg - 39.0).abs() < 1e-9);
    assert_eq!(res.altitude_m(), None);
}

#[test]
fn test_contrail_term() {
    let res = model().evaluate("AFR1234", 1000.0, "A320", contrail(10.0, 1.0)).unwrap();
    assert!((res.contrail_area_km2() - 40.0).abs() < 1e-12);
    assert!((res.co2_contrail_kg() - 4500.0).abs() < 1e-9);
    assert!((res.co2_total_kg() - 13_980.0).abs() < 1e-9);
    assert!((res.contrail_share() - 4500.0 / 13_980.0).abs() < 1e-12);

    let half = model().evaluate("AFR1234", 1000.0, "A320", contrail(10.0, 0.5)).unwrap();
    assert!((half.co2_contrail_kg() - 2250.0).abs() < 1e-9);
}

#[test]
fn test_contrail_term_is_monotone_in_pixels() {
    let m = model();
    let totals = (0..50)
        .map(|p| m.evaluate("X", 500.0, "B787-9", contrail(f64::from(p) * 7.0, 0.8)).unwrap().co2_total_kg())
        .collect_vec();
    assert!(totals.iter().tuple_windows().all(|(a, b)| a < b));
}

#[test]
fn test_evaluation_is_deterministic() {
    let m = model();
    let a = m.evaluate("BAW9", 812.5, "A350-900", contrail(33.0, 0.71)).unwrap();
    let b = m.evaluate("BAW9", 812.5, "A350-900", contrail(33.0, 0.71)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_aircraft_is_named() {
    let err = model().evaluate("CES1", 1000.0, "C919", ContrailStats::none(4)).unwrap_err();
    assert_eq!(err, EmissionError::UnknownAircraft(String::from("C919")));

    let mut config = CoreConfig::default();
    config.aircraft.remove(&AircraftType::A380);
    let reduced = EmissionModel::new(Arc::new(config));
    assert_eq!(
        reduced.resolve_aircraft("A380-841"),
        Err(EmissionError::UnknownAircraft(String::from("A380")))
    );
}

#[test]
fn test_invalid_inputs() {
    let m = model();
    for d in [0.0, -10.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            m.evaluate("X", d, "A320", ContrailStats::none(4)),
            Err(EmissionError::InvalidDistance(_))
        ));
    }
    let too_many = ContrailStats { pixel_count: 5.0, total_pixels: 4, intensity: 0.5 };
    assert_eq!(m.evaluate("X", 10.0, "A320", too_many), Err(EmissionError::InvalidContrail));
    assert_eq!(m.evaluate("X", 10.0, "A320", contrail(1.0, 1.5)), Err(EmissionError::InvalidContrail));
}

#[test]
fn test_altitude_aware_evaluation() {
    let m = model();
    let base = m.evaluate("DLH400", 1000.0, "A320", contrail(100.0, 1.0)).unwrap();

    let high = m.evaluate_at_altitude(&base, 11_000).unwrap();
    assert_eq!(high.altitude_m(), Some(11_000));
    assert!((high.fuel_burn_kg() - 2550.0).abs() < 1e-9);
    assert!((high.contrail().pixel_count - 103.0).abs() < 1e-9);

    let low = m.evaluate_at_altitude(&base, 8_500).unwrap();
    assert!((low.fuel_burn_kg() - 2760.0).abs() < 1e-9);
    assert!(low.contrail().pixel_count < high.contrail().pixel_count);

    assert_eq!(m.evaluate_at_altitude(&base, 7_000), Err(EmissionError::AltitudeOutOfBand(7_000)));
}

#[test]
fn test_scaled_coverage_is_capped() {
    let m = model();
    let saturated = ContrailStats { pixel_count: 1000.0, total_pixels: 1000, intensity: 0.9 };
    let base = m.evaluate("X", 100.0, "A321", saturated).unwrap();
    let top = m.evaluate_at_altitude(&base, 13_000).unwrap();
    assert!((top.contrail().pixel_count - 1000.0).abs() < f64::EPSILON);
    assert!((top.contrail().coverage_fraction() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_track_evaluation_resolves_variant() {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let samples = vec![
        TrackSample::new(t0, GeoPoint::new(0.0, 0.0), 10_500.0),
        TrackSample::new(t0 + TimeDelta::minutes(10), GeoPoint::new(0.0, 1.0), 10_500.0),
    ];
    let track = FlightTrack::new("EZY12", "a320-214", samples).unwrap();
    let res = model().evaluate_track(&track, ContrailStats::none(16)).unwrap();
    assert_eq!(res.flight_id(), "EZY12");
    assert_eq!(res.aircraft(), AircraftType::A320);
    // one degree of longitude on the equator
    assert!((res.distance_km() - 111.195).abs() < 0.01);
}

#[test]
fn test_reevaluation_is_relative_to_observed_altitude() {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let samples = vec![
        TrackSample::new(t0, GeoPoint::new(47.0, 2.0), 11_000.0),
        TrackSample::new(t0 + TimeDelta::minutes(30), GeoPoint::new(47.0, 6.0), 11_020.0),
    ];
    let track = FlightTrack::new("DLH7XY", "A320", samples).unwrap();
    let m = model();
    let observed = ContrailStats { pixel_count: 8.0, total_pixels: 64, intensity: 0.9 };
    let base = m.evaluate_track(&track, observed).unwrap();
    assert_eq!(base.observed_altitude_m(), Some(11_010));

    let same = m.evaluate_at_altitude(&base, 11_010).unwrap();
    assert!((same.contrail().pixel_count - 8.0).abs() < 1e-9);
    assert!((same.fuel_burn_kg() - base.fuel_burn_kg()).abs() < 1e-9);
    assert!((same.co2_total_kg() - base.co2_total_kg()).abs() < 1e-9);

    let low = m.evaluate_at_altitude(&base, 8_500).unwrap();
    assert_eq!(low.observed_altitude_m(), Some(8_500));
    let curve = &m.config().propensity;
    let expected_pixels = 8.0 * curve.multiplier(8_500) / curve.multiplier(11_010);
    assert!((low.contrail().pixel_count - expected_pixels).abs() < 1e-9);
    assert!((low.fuel_burn_kg() - base.fuel_burn_kg() * 0.92 / 0.85).abs() < 1e-9);

    // chained re-evaluation lands where a direct one does
    let back = m.evaluate_at_altitude(&low, 11_010).unwrap();
    assert!((back.co2_total_kg() - base.co2_total_kg()).abs() < 1e-6);
}

#[test]
fn test_fleet_summary() {
    let m = model();
    let results = [
        m.evaluate("A", 1000.0, "A320", ContrailStats::none(4)).unwrap(),
        m.evaluate("B", 1000.0, "A320", contrail(10.0, 1.0)).unwrap(),
    ];
    let summary = FleetSummary::from_results(&results);
    assert_eq!(summary.flights, 2);
    assert!((summary.co2_total_kg - 23_460.0).abs() < 1e-9);
    assert!((summary.mean_emission_factor().unwrap() - 11.73).abs() < 1e-9);
    assert!((summary.mean_co2_per_flight().unwrap() - 11_730.0).abs() < 1e-9);
    assert_eq!(FleetSummary::from_results(std::iter::empty()).mean_emission_factor(), None);
}
