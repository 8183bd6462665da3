use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use floodwatch_common::types::{RiskLevel, RunSummary};

use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error_response, success_paginated_response, success_response, ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

// GET /v1/risk-scores
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct RiskScoreQueryParams {
    /// Exact region id match (optional)
    #[param(required = false)]
    #[serde(rename = "region_id__eq")]
    region_id_eq: Option<String>,
    /// Risk level match: low / medium / high (optional)
    #[param(required = false)]
    #[serde(rename = "level__eq")]
    level_eq: Option<String>,
    /// Score date lower bound (inclusive, optional)
    #[param(required = false)]
    #[serde(rename = "date__gte")]
    date_gte: Option<NaiveDate>,
    /// Score date upper bound (inclusive, optional)
    #[param(required = false)]
    #[serde(rename = "date__lte")]
    date_lte: Option<NaiveDate>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    limit: Option<u64>,
    /// Page offset (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    offset: Option<u64>,
}

/// List computed risk scores, newest first.
#[utoipa::path(
    get,
    path = "/v1/risk-scores",
    tag = "RiskScores",
    params(RiskScoreQueryParams),
    responses(
        (status = 200, description = "Paginated risk score list"),
        (status = 400, description = "Unknown risk level filter", body = ApiError)
    )
)]
async fn list_risk_scores(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<RiskScoreQueryParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let region = params.region_id_eq.as_deref();

    let level = match params.level_eq.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<RiskLevel>() {
            Ok(level) => Some(level),
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &trace_id,
                    "bad_request",
                    &format!("unknown risk level: {raw}"),
                )
            }
        },
    };

    let total = match state
        .store
        .count_risk_scores(region, level, params.date_gte, params.date_lte)
        .await
    {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state
        .store
        .list_risk_scores(region, level, params.date_gte, params.date_lte, limit, offset)
        .await
    {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// The most recent score per region. Dashboards recover current state
/// from this after a restart.
#[utoipa::path(
    get,
    path = "/v1/risk-scores/latest",
    tag = "RiskScores",
    responses(
        (status = 200, description = "Latest score per region")
    )
)]
async fn latest_risk_scores(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.latest_risk_scores().await {
        Ok(scores) => success_response(StatusCode::OK, &trace_id, scores),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Recompute request. `score_date` defaults to today (UTC).
#[derive(Deserialize, ToSchema, Default)]
pub struct RecomputeRequest {
    #[serde(default)]
    pub score_date: Option<NaiveDate>,
}

/// Recompute scores and evaluate alert rules for every region.
/// Partial failure is reported in the run summary, not as an HTTP error.
#[utoipa::path(
    post,
    path = "/v1/recompute",
    tag = "RiskScores",
    request_body = RecomputeRequest,
    responses(
        (status = 200, description = "Run summary", body = RunSummary)
    )
)]
async fn recompute(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    body: Option<Json<RecomputeRequest>>,
) -> impl IntoResponse {
    let score_date = body.and_then(|Json(req)| req.score_date);
    let summary = state.orchestrator.clone().run(score_date).await;
    success_response(StatusCode::OK, &trace_id, summary)
}

pub fn risk_score_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_risk_scores))
        .routes(routes!(latest_risk_scores))
        .routes(routes!(recompute))
}
