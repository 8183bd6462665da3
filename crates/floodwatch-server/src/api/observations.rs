use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa_axum::{router::OpenApiRouter, routes};

use floodwatch_common::types::{CaseReport, EnvironmentalObservation};

use crate::api::pagination::PaginationParams;
use crate::api::{storage_error_response, success_paginated_response, success_response, ApiError};
use crate::logging::TraceId;
use crate::state::AppState;

// ---- Environmental observations ----

// GET /v1/observations/environmental
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ObservationQueryParams {
    /// Exact region id match (optional)
    #[param(required = false)]
    #[serde(rename = "region_id__eq")]
    region_id_eq: Option<String>,
    /// Date lower bound (inclusive, optional)
    #[param(required = false)]
    #[serde(rename = "date__gte")]
    date_gte: Option<NaiveDate>,
    /// Date upper bound (inclusive, optional)
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

/// Upsert one environmental observation for a (region, date) pair.
/// Re-submitting the same pair overwrites the previous row.
#[utoipa::path(
    put,
    path = "/v1/observations/environmental",
    tag = "Observations",
    request_body = EnvironmentalObservation,
    responses(
        (status = 200, description = "Stored observation", body = EnvironmentalObservation),
        (status = 400, description = "Metric out of range", body = ApiError),
        (status = 404, description = "Unknown region", body = ApiError)
    )
)]
async fn upsert_environmental(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(obs): Json<EnvironmentalObservation>,
) -> impl IntoResponse {
    match state.store.upsert_environmental(&obs).await {
        Ok(stored) => success_response(StatusCode::OK, &trace_id, stored),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// List environmental observations, newest first.
#[utoipa::path(
    get,
    path = "/v1/observations/environmental",
    tag = "Observations",
    params(ObservationQueryParams),
    responses(
        (status = 200, description = "Paginated observation list")
    )
)]
async fn list_environmental(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ObservationQueryParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let region = params.region_id_eq.as_deref();

    let total = match state
        .store
        .count_environmental(region, params.date_gte, params.date_lte)
        .await
    {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state
        .store
        .list_environmental(region, params.date_gte, params.date_lte, limit, offset)
        .await
    {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

// ---- Case reports ----

/// Upsert one case report for a (region, date) pair.
#[utoipa::path(
    put,
    path = "/v1/observations/cases",
    tag = "Observations",
    request_body = CaseReport,
    responses(
        (status = 200, description = "Stored case report", body = CaseReport),
        (status = 400, description = "Negative case count", body = ApiError),
        (status = 404, description = "Unknown region", body = ApiError)
    )
)]
async fn upsert_cases(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(report): Json<CaseReport>,
) -> impl IntoResponse {
    match state.store.upsert_case_report(&report).await {
        Ok(stored) => success_response(StatusCode::OK, &trace_id, stored),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// List case reports, newest first.
#[utoipa::path(
    get,
    path = "/v1/observations/cases",
    tag = "Observations",
    params(ObservationQueryParams),
    responses(
        (status = 200, description = "Paginated case report list")
    )
)]
async fn list_cases(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ObservationQueryParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let region = params.region_id_eq.as_deref();

    let total = match state
        .store
        .count_case_reports(region, params.date_gte, params.date_lte)
        .await
    {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state
        .store
        .list_case_reports(region, params.date_gte, params.date_lte, limit, offset)
        .await
    {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

pub fn observation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upsert_environmental, list_environmental))
        .routes(routes!(upsert_cases, list_cases))
}
