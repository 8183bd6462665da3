use chrono::{NaiveDate, Utc};
use serde_json::json;

use floodwatch_common::id;
use floodwatch_common::types::{
    Alert, AlertState, CaseReport, EnvironmentalObservation, Region, RiskLevel, RiskScore,
    Severity,
};

use crate::error::StorageError;
use crate::store::{AlertFilter, AlertRuleRow, SurveillanceStore};

async fn test_store() -> SurveillanceStore {
    SurveillanceStore::new("sqlite::memory:")
        .await
        .expect("in-memory store")
}

fn date(s: &str) -> NaiveDate {
    s.parse().expect("test date")
}

fn sample_region(code: &str) -> Region {
    Region {
        id: id::next_id(),
        code: code.to_string(),
        name: format!("Region {code}"),
        population: Some(250_000),
        area_sq_km: Some(1_200.0),
        water_coverage_pct: Some(40.0),
        sanitation_coverage_pct: Some(40.0),
        health_facilities_count: 12,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_observation(region_id: &str, day: &str) -> EnvironmentalObservation {
    EnvironmentalObservation {
        region_id: region_id.to_string(),
        observation_date: date(day),
        rainfall_mm: Some(24.0),
        rainfall_7day_mm: Some(120.0),
        rainfall_30day_mm: Some(310.0),
        ndwi: Some(0.25),
        ndvi: Some(0.4),
        flood_extent_pct: Some(5.0),
        flood_observed: false,
        land_surface_temp: Some(31.5),
        data_source: Some("GEE".to_string()),
    }
}

fn sample_score(region_id: &str, day: &str, composite: f64, level: RiskLevel) -> RiskScore {
    RiskScore {
        region_id: region_id.to_string(),
        score_date: date(day),
        flood_score: 0.4,
        rainfall_score: 0.5,
        case_score: 0.2,
        vulnerability_score: 0.6,
        composite_score: composite,
        level,
        flood_fallback: false,
        rainfall_fallback: false,
        case_fallback: false,
        vulnerability_fallback: false,
        rainfall_7day_mm: Some(120.0),
        ndwi: Some(0.25),
        recent_cases: 3,
        recent_deaths: 0,
        algorithm_version: "1.0".to_string(),
        calculated_at: Utc::now(),
    }
}

fn sample_alert(region_id: &str, alert_type: &str) -> Alert {
    Alert {
        id: id::next_id(),
        region_id: region_id.to_string(),
        rule_id: "rule-1".to_string(),
        alert_type: alert_type.to_string(),
        severity: Severity::Critical,
        level: RiskLevel::High,
        title: "Heavy rainfall".to_string(),
        message: "7-day rainfall exceeded 150 mm".to_string(),
        triggered_by: json!({"rainfall_7day_mm": 180.0}),
        state: AlertState::Open,
        created_at: Utc::now(),
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        resolution: None,
    }
}

#[tokio::test]
async fn test_upsert_region_is_idempotent_by_code() {
    let store = test_store().await;
    let region = sample_region("CR-CAL");
    store.upsert_region(&region).await.unwrap();

    let mut updated = region.clone();
    updated.name = "Calabar Municipal".to_string();
    store.upsert_region(&updated).await.unwrap();

    assert_eq!(store.count_regions().await.unwrap(), 1);
    let fetched = store.get_region_by_code("CR-CAL").await.unwrap().unwrap();
    assert_eq!(fetched.name, "Calabar Municipal");
}

#[tokio::test]
async fn test_observation_upsert_overwrites_same_date() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let mut obs = sample_observation(&region.id, "2025-08-01");
    store.upsert_environmental(&obs).await.unwrap();

    obs.rainfall_7day_mm = Some(210.0);
    store.upsert_environmental(&obs).await.unwrap();

    let rows = store
        .query_environmental_range(&region.id, date("2025-08-01"), date("2025-08-01"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].rainfall_7day_mm, Some(210.0));
}

#[tokio::test]
async fn test_observation_rejects_unknown_region() {
    let store = test_store().await;
    let obs = sample_observation("no-such-region", "2025-08-01");
    let err = store.upsert_environmental(&obs).await.unwrap_err();
    assert!(matches!(err, StorageError::UnknownRegion { .. }));
}

#[tokio::test]
async fn test_observation_rejects_out_of_range_metric() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let mut obs = sample_observation(&region.id, "2025-08-01");
    obs.ndwi = Some(1.5);
    let err = store.upsert_environmental(&obs).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidMetric { .. }));

    obs.ndwi = Some(0.2);
    obs.rainfall_mm = Some(-3.0);
    let err = store.upsert_environmental(&obs).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidMetric { .. }));
}

#[tokio::test]
async fn test_case_report_rejects_negative_counts() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let report = CaseReport {
        region_id: region.id.clone(),
        report_date: date("2025-08-01"),
        new_cases: -1,
        deaths: 0,
        suspected_cases: 0,
        confirmed_cases: 0,
    };
    let err = store.upsert_case_report(&report).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidMetric { .. }));
}

#[tokio::test]
async fn test_case_range_query_is_ascending() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    for (day, cases) in [("2025-08-03", 5), ("2025-08-01", 2), ("2025-08-02", 3)] {
        let report = CaseReport {
            region_id: region.id.clone(),
            report_date: date(day),
            new_cases: cases,
            deaths: 0,
            suspected_cases: cases,
            confirmed_cases: 0,
        };
        store.upsert_case_report(&report).await.unwrap();
    }

    let rows = store
        .query_case_range(&region.id, date("2025-08-01"), date("2025-08-03"))
        .await
        .unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.report_date).collect();
    assert_eq!(
        dates,
        vec![date("2025-08-01"), date("2025-08-02"), date("2025-08-03")]
    );
}

#[tokio::test]
async fn test_risk_score_overwrite_and_latest() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    store
        .upsert_risk_score(&sample_score(&region.id, "2025-08-01", 0.40, RiskLevel::Medium))
        .await
        .unwrap();
    store
        .upsert_risk_score(&sample_score(&region.id, "2025-08-02", 0.70, RiskLevel::High))
        .await
        .unwrap();
    // Recompute of the same date overwrites, not duplicates
    store
        .upsert_risk_score(&sample_score(&region.id, "2025-08-02", 0.75, RiskLevel::High))
        .await
        .unwrap();

    assert_eq!(
        store
            .count_risk_scores(Some(&region.id), None, None, None)
            .await
            .unwrap(),
        2
    );
    let latest = store.latest_risk_scores().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].score_date, date("2025-08-02"));
    assert!((latest[0].composite_score - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn test_level_history_is_most_recent_first() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    for (day, level) in [
        ("2025-08-01", RiskLevel::Low),
        ("2025-08-02", RiskLevel::High),
        ("2025-08-03", RiskLevel::High),
    ] {
        store
            .upsert_risk_score(&sample_score(&region.id, day, 0.5, level))
            .await
            .unwrap();
    }

    let history = store
        .level_history(&region.id, date("2025-08-03"), 2)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].score_date, date("2025-08-03"));
    assert_eq!(history[1].score_date, date("2025-08-02"));
    assert!(history.iter().all(|s| s.level == RiskLevel::High));
}

#[tokio::test]
async fn test_unresolved_alert_lookup_for_dedup() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let alert = sample_alert(&region.id, "heavy_rainfall");
    store.insert_alert(&alert).await.unwrap();

    let found = store
        .find_unresolved_alert(&region.id, "heavy_rainfall")
        .await
        .unwrap();
    assert!(found.is_some());

    store.resolve_alert(&alert.id, "manual").await.unwrap();
    let found = store
        .find_unresolved_alert(&region.id, "heavy_rainfall")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_acknowledge_is_idempotent_and_resolved_is_terminal() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let alert = sample_alert(&region.id, "case_spike");
    store.insert_alert(&alert).await.unwrap();

    let first = store.acknowledge_alert(&alert.id, "dr.okafor").await.unwrap();
    assert_eq!(first.state, AlertState::Acknowledged);
    assert_eq!(first.acknowledged_by.as_deref(), Some("dr.okafor"));

    // Second acknowledge keeps the original actor and timestamp
    let second = store.acknowledge_alert(&alert.id, "someone.else").await.unwrap();
    assert_eq!(second.acknowledged_by.as_deref(), Some("dr.okafor"));
    assert_eq!(second.acknowledged_at, first.acknowledged_at);

    let resolved = store.resolve_alert(&alert.id, "manual").await.unwrap();
    assert_eq!(resolved.state, AlertState::Resolved);

    // Resolve again: no-op success, resolution kind unchanged
    let again = store.resolve_alert(&alert.id, "auto").await.unwrap();
    assert_eq!(again.resolution.as_deref(), Some("manual"));

    // Acknowledging after resolution is an illegal transition
    let err = store.acknowledge_alert(&alert.id, "late.actor").await.unwrap_err();
    assert!(matches!(err, StorageError::IllegalTransition { .. }));
}

#[tokio::test]
async fn test_acknowledge_missing_alert_is_not_found() {
    let store = test_store().await;
    let err = store.acknowledge_alert("missing", "nobody").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_alert_filter_by_state() {
    let store = test_store().await;
    let region = store.upsert_region(&sample_region("CR-CAL")).await.unwrap();

    let open = sample_alert(&region.id, "heavy_rainfall");
    store.insert_alert(&open).await.unwrap();
    let acked = sample_alert(&region.id, "case_spike");
    store.insert_alert(&acked).await.unwrap();
    store.acknowledge_alert(&acked.id, "dr.okafor").await.unwrap();
    let resolved = sample_alert(&region.id, "sustained_high_risk");
    store.insert_alert(&resolved).await.unwrap();
    store.resolve_alert(&resolved.id, "auto").await.unwrap();

    let active = store
        .list_alerts(
            &AlertFilter {
                active: Some(true),
                ..Default::default()
            },
            100,
            0,
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 2);

    let only_open = store
        .list_alerts(
            &AlertFilter {
                state: Some(AlertState::Open),
                ..Default::default()
            },
            100,
            0,
        )
        .await
        .unwrap();
    assert_eq!(only_open.len(), 1);
    assert_eq!(only_open[0].alert_type, "heavy_rainfall");

    let summary = store.alert_summary().await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.active_count, 2);
    assert_eq!(summary.resolved_count, 1);
    assert_eq!(summary.by_severity.get("critical"), Some(&2));
}

#[tokio::test]
async fn test_alert_rule_crud_and_enabled_listing() {
    let store = test_store().await;

    let row = AlertRuleRow {
        id: id::next_id(),
        name: "heavy_rainfall_default".to_string(),
        alert_type: "heavy_rainfall".to_string(),
        region_pattern: "*".to_string(),
        severity: "warning".to_string(),
        enabled: true,
        auto_resolve: true,
        conditions_json: r#"[{"kind":"metric_threshold","metric":"rainfall_7day_mm","op":"gte","value":150.0}]"#.to_string(),
        source: "default".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    store.insert_alert_rule(&row).await.unwrap();

    assert_eq!(store.count_alert_rules(None, None).await.unwrap(), 1);
    assert_eq!(store.list_enabled_alert_rules().await.unwrap().len(), 1);

    store.set_alert_rule_enabled(&row.id, false).await.unwrap();
    assert!(store.list_enabled_alert_rules().await.unwrap().is_empty());

    assert!(store.delete_alert_rule(&row.id).await.unwrap());
    assert!(!store.delete_alert_rule(&row.id).await.unwrap());
}
