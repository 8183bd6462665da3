use chrono::{NaiveDate, Utc};

use floodwatch_common::types::{CaseReport, EnvironmentalObservation, Region, RiskLevel};

use crate::classify::classify;
use crate::config::{LevelThresholds, RiskConfig};
use crate::score::{ScoreCalculator, ScoreInputs};

fn date(s: &str) -> NaiveDate {
    s.parse().expect("test date")
}

fn test_config() -> RiskConfig {
    RiskConfig {
        weights: Default::default(),
        thresholds: LevelThresholds {
            medium_cutoff: 0.3,
            high_cutoff: 0.6,
        },
        reference: Default::default(),
        windows: Default::default(),
    }
}

fn test_region(water: Option<f64>, sanitation: Option<f64>) -> Region {
    Region {
        id: "r1".to_string(),
        code: "CR-CAL".to_string(),
        name: "Calabar".to_string(),
        population: Some(400_000),
        area_sq_km: Some(1_100.0),
        water_coverage_pct: water,
        sanitation_coverage_pct: sanitation,
        health_facilities_count: 10,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn observation(day: &str) -> EnvironmentalObservation {
    EnvironmentalObservation {
        region_id: "r1".to_string(),
        observation_date: date(day),
        rainfall_mm: None,
        rainfall_7day_mm: None,
        rainfall_30day_mm: None,
        ndwi: None,
        ndvi: None,
        flood_extent_pct: None,
        flood_observed: false,
        land_surface_temp: None,
        data_source: None,
    }
}

fn case_report(day: &str, new_cases: i64, deaths: i64) -> CaseReport {
    CaseReport {
        region_id: "r1".to_string(),
        report_date: date(day),
        new_cases,
        deaths,
        suspected_cases: new_cases,
        confirmed_cases: 0,
    }
}

fn compute_with(
    region: &Region,
    observations: &[EnvironmentalObservation],
    case_reports: &[CaseReport],
) -> floodwatch_common::types::RiskScore {
    let calc = ScoreCalculator::new(test_config()).unwrap();
    calc.compute(&ScoreInputs {
        region,
        score_date: date("2025-08-07"),
        observations,
        case_reports,
    })
}

#[test]
fn test_classifier_boundaries_are_inclusive_upward() {
    let t = LevelThresholds {
        medium_cutoff: 0.3,
        high_cutoff: 0.6,
    };
    assert_eq!(classify(0.2999, &t), RiskLevel::Low);
    assert_eq!(classify(0.3, &t), RiskLevel::Medium);
    assert_eq!(classify(0.5999, &t), RiskLevel::Medium);
    assert_eq!(classify(0.6, &t), RiskLevel::High);
    assert_eq!(classify(0.6001, &t), RiskLevel::High);
}

#[test]
fn test_weight_sum_validation() {
    let mut config = test_config();
    config.weights.flood = 0.39;
    assert!(config.validate().is_err(), "sum 0.99 must be rejected");

    config.weights.flood = 0.41;
    assert!(config.validate().is_err(), "sum 1.01 must be rejected");

    config.weights.flood = 0.4;
    assert!(config.validate().is_ok());
}

#[test]
fn test_cut_point_ordering_validation() {
    let mut config = test_config();
    config.thresholds = LevelThresholds {
        medium_cutoff: 0.6,
        high_cutoff: 0.3,
    };
    assert!(config.validate().is_err());

    config.thresholds = LevelThresholds {
        medium_cutoff: 0.0,
        high_cutoff: 0.6,
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_all_inputs_missing_yields_neutral_midpoint() {
    let region = test_region(None, None);
    let score = compute_with(&region, &[], &[]);

    assert!((score.flood_score - 0.5).abs() < 1e-9);
    assert!((score.rainfall_score - 0.5).abs() < 1e-9);
    assert!((score.case_score - 0.5).abs() < 1e-9);
    assert!((score.vulnerability_score - 0.5).abs() < 1e-9);
    assert!((score.composite_score - 0.5).abs() < 1e-9);
    assert!(score.flood_fallback);
    assert!(score.rainfall_fallback);
    assert!(score.case_fallback);
    assert!(score.vulnerability_fallback);
    assert_eq!(score.level, RiskLevel::Medium);
}

#[test]
fn test_zero_cases_is_measured_not_fallback() {
    let region = test_region(Some(80.0), Some(80.0));
    let score = compute_with(&region, &[], &[case_report("2025-08-01", 0, 0)]);

    assert!((score.case_score - 0.0).abs() < 1e-9);
    assert!(!score.case_fallback);
}

#[test]
fn test_flood_observed_saturates_flood_score() {
    let region = test_region(Some(80.0), Some(80.0));
    let mut obs = observation("2025-08-07");
    obs.ndwi = Some(-0.4); // very dry index reading
    obs.flood_observed = true;
    let score = compute_with(&region, &[obs], &[]);

    assert!((score.flood_score - 1.0).abs() < 1e-9);
    assert!(!score.flood_fallback);
}

#[test]
fn test_rainfall_blends_weekly_and_monthly() {
    let region = test_region(Some(80.0), Some(80.0));
    let mut obs = observation("2025-08-07");
    obs.rainfall_7day_mm = Some(100.0); // lin = 0.5 over 200
    obs.rainfall_30day_mm = Some(250.0); // lin = 0.5 over 500
    let score = compute_with(&region, &[obs.clone()], &[]);
    assert!((score.rainfall_score - 0.5).abs() < 1e-9);

    obs.rainfall_30day_mm = None;
    let score = compute_with(&region, &[obs], &[]);
    assert!((score.rainfall_score - 0.5).abs() < 1e-9);
}

#[test]
fn test_rainfall_falls_back_to_daily_sum() {
    let region = test_region(Some(80.0), Some(80.0));
    let mut day1 = observation("2025-08-06");
    day1.rainfall_mm = Some(60.0);
    let mut day2 = observation("2025-08-07");
    day2.rainfall_mm = Some(40.0);
    let score = compute_with(&region, &[day1, day2], &[]);

    // 100 mm summed over the window, lin over 200
    assert!((score.rainfall_score - 0.5).abs() < 1e-9);
    assert_eq!(score.rainfall_7day_mm, Some(100.0));
    assert!(!score.rainfall_fallback);
}

#[test]
fn test_high_cfr_amplifies_case_score() {
    let region = test_region(Some(80.0), Some(80.0));

    let quiet = compute_with(&region, &[], &[case_report("2025-08-01", 10, 0)]);
    assert!((quiet.case_score - 0.2).abs() < 1e-9);

    // CFR 0.1 > 0.05 threshold: 0.2 * 1.3
    let deadly = compute_with(&region, &[], &[case_report("2025-08-01", 10, 1)]);
    assert!((deadly.case_score - 0.26).abs() < 1e-9);
    assert_eq!(deadly.recent_deaths, 1);
}

#[test]
fn test_case_score_clamps_after_amplification() {
    let region = test_region(Some(80.0), Some(80.0));
    let score = compute_with(&region, &[], &[case_report("2025-08-01", 49, 5)]);
    // 0.98 * 1.3 clamps to 1.0
    assert!((score.case_score - 1.0).abs() < 1e-9);
}

#[test]
fn test_vulnerability_from_coverage_gaps() {
    let both = compute_with(&test_region(Some(40.0), Some(40.0)), &[], &[]);
    assert!((both.vulnerability_score - 0.6).abs() < 1e-9);
    assert!(!both.vulnerability_fallback);

    let one = compute_with(&test_region(Some(40.0), None), &[], &[]);
    assert!((one.vulnerability_score - 0.6).abs() < 1e-9);

    let none = compute_with(&test_region(None, None), &[], &[]);
    assert!(none.vulnerability_fallback);
}

#[test]
fn test_determinism_same_inputs_same_score() {
    let region = test_region(Some(40.0), Some(40.0));
    let mut obs = observation("2025-08-07");
    obs.ndwi = Some(0.35);
    obs.rainfall_7day_mm = Some(180.0);
    let reports = vec![case_report("2025-08-01", 8, 0)];

    let a = compute_with(&region, std::slice::from_ref(&obs), &reports);
    let b = compute_with(&region, std::slice::from_ref(&obs), &reports);
    assert_eq!(a.composite_score, b.composite_score);
    assert_eq!(a.level, b.level);
    assert_eq!(a.flood_score, b.flood_score);
}

#[test]
fn test_flood_emergency_scenario_classifies_high() {
    // Saturated rainfall, observed flooding, moderate case load, weak
    // water/sanitation coverage.
    let region = test_region(Some(40.0), Some(40.0));
    let mut obs = observation("2025-08-07");
    obs.rainfall_7day_mm = Some(220.0);
    obs.ndwi = Some(0.35);
    obs.flood_observed = true;
    let reports = vec![case_report("2025-08-05", 12, 0)];

    let score = compute_with(&region, &[obs], &reports);
    assert!((score.flood_score - 1.0).abs() < 1e-9);
    assert!((score.rainfall_score - 1.0).abs() < 1e-9);
    assert!((score.case_score - 0.24).abs() < 1e-9);
    assert!((score.vulnerability_score - 0.6).abs() < 1e-9);
    assert!((score.composite_score - 0.732).abs() < 1e-9);
    assert_eq!(score.level, RiskLevel::High);
}
