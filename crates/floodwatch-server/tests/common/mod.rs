#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

use floodwatch_alert::AlertEngine;
use floodwatch_risk::{LevelThresholds, RiskConfig, ScoreCalculator};
use floodwatch_server::app;
use floodwatch_server::config::{DatabaseConfig, RecomputeConfig, ServerConfig};
use floodwatch_server::orchestrator::RecomputeOrchestrator;
use floodwatch_server::rule_builder;
use floodwatch_server::rule_seed;
use floodwatch_server::state::AppState;
use floodwatch_storage::SurveillanceStore;

pub struct TestContext {
    pub state: AppState,
    pub app: axum::Router,
}

pub fn test_risk_config() -> RiskConfig {
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

pub async fn build_test_context() -> Result<TestContext> {
    floodwatch_common::id::init(1, 1);

    let store = Arc::new(SurveillanceStore::new("sqlite::memory:").await?);
    let risk = test_risk_config();
    let calculator = Arc::new(ScoreCalculator::new(risk.clone())?);

    rule_seed::init_default_rules(&store).await?;
    let alert_engine = Arc::new(Mutex::new(AlertEngine::new(vec![])));
    rule_builder::reload_alert_engine(&store, &alert_engine).await?;

    let recompute = RecomputeConfig::default();
    let orchestrator = Arc::new(RecomputeOrchestrator::new(
        store.clone(),
        calculator.clone(),
        alert_engine.clone(),
        recompute.clone(),
    ));

    let config = ServerConfig {
        http_port: 8080,
        cors_allowed_origins: vec![],
        database: DatabaseConfig::default(),
        risk,
        recompute,
    };

    let state = AppState {
        store,
        calculator,
        alert_engine,
        orchestrator,
        start_time: Utc::now(),
        config: Arc::new(config),
    };

    let app = app::build_http_app(state.clone());

    Ok(TestContext { state, app })
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = builder.header("Content-Type", "application/json");

    let req_body = body.unwrap_or(Value::Null).to_string();
    let req = builder
        .body(Body::from(req_body))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["err_code"], 0);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
}

pub fn assert_err_envelope(json: &Value, err_code: i32) {
    assert_eq!(json["err_code"], err_code);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json.get("data").is_some());
    assert!(json["data"].is_null());
}

pub fn decode_data<T: DeserializeOwned>(json: &Value) -> T {
    serde_json::from_value(json["data"].clone()).expect("data should decode")
}

/// Upsert a region over HTTP and return its id.
pub async fn seed_region(app: &axum::Router, code: &str, name: &str) -> String {
    let (status, body, _) = request_json(
        app,
        "PUT",
        "/v1/regions",
        Some(serde_json::json!({
            "code": code,
            "name": name,
            "population": 250000,
            "water_coverage_pct": 40.0,
            "sanitation_coverage_pct": 40.0,
            "health_facilities_count": 12
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    body["data"]["id"]
        .as_str()
        .expect("region id should exist")
        .to_string()
}
