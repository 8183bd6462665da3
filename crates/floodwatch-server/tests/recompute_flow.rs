mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    assert_err_envelope, assert_ok_envelope, build_test_context, request_json, request_no_body,
    seed_region, TestContext,
};

async fn put_flood_observation(ctx: &TestContext, region_id: &str, date: &str) {
    let (status, _, _) = request_json(
        &ctx.app,
        "PUT",
        "/v1/observations/environmental",
        Some(json!({
            "region_id": region_id,
            "observation_date": date,
            "rainfall_mm": 32.0,
            "rainfall_7day_mm": 220.0,
            "ndwi": 0.35,
            "flood_observed": true,
            "data_source": "GEE"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn put_cases(ctx: &TestContext, region_id: &str, date: &str, new_cases: i64) {
    let (status, _, _) = request_json(
        &ctx.app,
        "PUT",
        "/v1/observations/cases",
        Some(json!({
            "region_id": region_id,
            "report_date": date,
            "new_cases": new_cases,
            "deaths": 0,
            "suspected_cases": new_cases,
            "confirmed_cases": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn recompute(ctx: &TestContext, date: &str) -> serde_json::Value {
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/recompute",
        Some(json!({"score_date": date})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    body["data"].clone()
}

#[tokio::test]
async fn flood_scenario_scores_high_and_opens_alerts() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;

    let summary = recompute(&ctx, "2024-07-15").await;
    assert_eq!(summary["regions_succeeded"], 1);
    assert_eq!(summary["regions_failed"], 0);
    // flood_case_compound and heavy_rainfall fire; case_spike needs 20
    // cases and sustained_high_risk needs two days
    assert_eq!(summary["alerts_opened"], 2);
    assert_eq!(summary["alerts_resolved"], 0);

    let (status, body, _) = request_no_body(&ctx.app, "GET", "/v1/risk-scores/latest").await;
    assert_eq!(status, StatusCode::OK);
    let score = &body["data"][0];
    assert_eq!(score["level"], "high");
    assert_eq!(score["flood_score"], 1.0);
    assert_eq!(score["rainfall_score"], 1.0);
    assert_eq!(score["case_score"], 0.24);
    assert_eq!(score["vulnerability_score"], 0.6);
    let composite = score["composite_score"].as_f64().expect("composite");
    assert!((composite - 0.732).abs() < 1e-9);

    let (status, body, _) = request_no_body(
        &ctx.app,
        "GET",
        "/v1/alerts?active=true&alert_type__eq=flood_case_compound",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let alert = &body["data"]["items"][0];
    assert_eq!(alert["severity"], "critical");
    assert_eq!(alert["state"], "open");
    assert_eq!(alert["region_id"], region_id);
    // Trigger context captures the signals that fired the rule
    assert_eq!(alert["triggered_by"]["rainfall_7day_mm"], 220.0);
    assert_eq!(alert["triggered_by"]["flood_observed"], true);
}

#[tokio::test]
async fn recompute_is_idempotent_and_deduplicates_alerts() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;

    let first = recompute(&ctx, "2024-07-15").await;
    assert_eq!(first["alerts_opened"], 2);

    // Same date again: scores overwrite, unresolved alerts absorb triggers
    let second = recompute(&ctx, "2024-07-15").await;
    assert_eq!(second["regions_succeeded"], 1);
    assert_eq!(second["alerts_opened"], 0);
    assert_eq!(second["alerts_resolved"], 0);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/alerts?active=true").await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn sustained_high_risk_fires_on_second_consecutive_day() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;
    let day1 = recompute(&ctx, "2024-07-15").await;
    assert_eq!(day1["alerts_opened"], 2);

    put_flood_observation(&ctx, &region_id, "2024-07-16").await;
    put_cases(&ctx, &region_id, "2024-07-16", 12).await;
    let day2 = recompute(&ctx, "2024-07-16").await;
    // Only sustained_high_risk is new; the rest deduplicate
    assert_eq!(day2["alerts_opened"], 1);

    let (_, body, _) = request_no_body(
        &ctx.app,
        "GET",
        "/v1/alerts?active=true&alert_type__eq=sustained_high_risk",
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn alerts_auto_resolve_when_conditions_clear() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;
    let opened = recompute(&ctx, "2024-07-15").await;
    assert_eq!(opened["alerts_opened"], 2);

    // Corrected upstream data: the flood never happened
    let (status, _, _) = request_json(
        &ctx.app,
        "PUT",
        "/v1/observations/environmental",
        Some(json!({
            "region_id": region_id,
            "observation_date": "2024-07-15",
            "rainfall_mm": 4.0,
            "rainfall_7day_mm": 10.0,
            "flood_observed": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    put_cases(&ctx, &region_id, "2024-07-15", 0).await;

    let cleared = recompute(&ctx, "2024-07-15").await;
    assert_eq!(cleared["alerts_opened"], 0);
    assert_eq!(cleared["alerts_resolved"], 2);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/alerts?active=true").await;
    assert_eq!(body["data"]["total"], 0);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/alerts?state__eq=resolved").await;
    assert_eq!(body["data"]["total"], 2);
    let items = body["data"]["items"].as_array().expect("items");
    assert!(items.iter().all(|a| a["resolution"] == "auto"));
}

#[tokio::test]
async fn acknowledge_and_resolve_lifecycle_over_http() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;
    recompute(&ctx, "2024-07-15").await;

    let (_, body, _) = request_no_body(
        &ctx.app,
        "GET",
        "/v1/alerts?active=true&alert_type__eq=flood_case_compound",
    )
    .await;
    let alert_id = body["data"]["items"][0]["id"]
        .as_str()
        .expect("alert id")
        .to_string();

    // Acknowledge
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/acknowledge"),
        Some(json!({"acknowledged_by": "epi-team"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "acknowledged");
    assert_eq!(body["data"]["acknowledged_by"], "epi-team");

    // Re-acknowledging keeps the original operator
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/acknowledge"),
        Some(json!({"acknowledged_by": "someone-else"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["acknowledged_by"], "epi-team");

    // Resolve
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/resolve"),
        Some(json!({"resolution": "field team confirmed containment"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "resolved");

    // Resolving again is a no-op
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/resolve"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolution"], "field team confirmed containment");

    // Acknowledging a resolved alert conflicts
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/acknowledge"),
        Some(json!({"acknowledged_by": "late-operator"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&body, 1005);
}

#[tokio::test]
async fn alert_summary_groups_active_alerts() {
    let ctx = build_test_context().await.expect("context should build");
    let region_id = seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;

    put_flood_observation(&ctx, &region_id, "2024-07-15").await;
    put_cases(&ctx, &region_id, "2024-07-15", 12).await;
    recompute(&ctx, "2024-07-15").await;

    let (status, body, _) = request_no_body(&ctx.app, "GET", "/v1/alerts/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["active_count"], 2);
    assert_eq!(body["data"]["by_severity"]["critical"], 1);
    assert_eq!(body["data"]["by_severity"]["warning"], 1);
    assert_eq!(body["data"]["by_region"][region_id.as_str()], 2);
}

#[tokio::test]
async fn partial_failure_is_reported_per_region() {
    let ctx = build_test_context().await.expect("context should build");
    seed_region(&ctx.app, "CR-CAL", "Calabar Municipal").await;
    let akp = seed_region(&ctx.app, "CR-AKP", "Akpabuyo").await;

    // Only one region has any data; both still score (missing signals
    // fall back to neutral) and the run succeeds for both
    put_flood_observation(&ctx, &akp, "2024-07-15").await;
    put_cases(&ctx, &akp, "2024-07-15", 25).await;

    let summary = recompute(&ctx, "2024-07-15").await;
    assert_eq!(summary["regions_succeeded"], 2);
    assert_eq!(summary["regions_failed"], 0);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/risk-scores/latest").await;
    let scores = body["data"].as_array().expect("scores");
    assert_eq!(scores.len(), 2);
    // The data-free region sits at the neutral midpoint with fallbacks
    let quiet = scores
        .iter()
        .find(|s| s["region_id"] != akp)
        .expect("quiet region score");
    assert_eq!(quiet["flood_fallback"], true);
    assert_eq!(quiet["rainfall_fallback"], true);
    assert_eq!(quiet["case_fallback"], true);
}
