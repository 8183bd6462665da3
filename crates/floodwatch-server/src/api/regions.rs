use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use floodwatch_common::id;
use floodwatch_common::types::Region;

use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error_response, success_paginated_response, success_response, ApiError,
};
use crate::logging::TraceId;
use crate::state::AppState;

/// Region registration payload. Upserts by `code`.
#[derive(Deserialize, ToSchema)]
pub struct UpsertRegionRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub area_sq_km: Option<f64>,
    /// Share of population with clean water access, 0-100
    #[serde(default)]
    pub water_coverage_pct: Option<f64>,
    /// Share of population with sanitation access, 0-100
    #[serde(default)]
    pub sanitation_coverage_pct: Option<f64>,
    #[serde(default)]
    pub health_facilities_count: i32,
}

/// List registered regions.
#[utoipa::path(
    get,
    path = "/v1/regions",
    tag = "Regions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated region list")
    )
)]
async fn list_regions(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let limit = params.limit();
    let offset = params.offset();
    let total = match state.store.count_regions().await {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state.store.list_regions(limit, offset).await {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Fetch a single region by id.
#[utoipa::path(
    get,
    path = "/v1/regions/{id}",
    tag = "Regions",
    params(("id" = String, Path, description = "Region id")),
    responses(
        (status = 200, description = "Region", body = Region),
        (status = 404, description = "Region not found", body = ApiError)
    )
)]
async fn get_region(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_region(&id).await {
        Ok(Some(region)) => success_response(StatusCode::OK, &trace_id, region),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("region {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Register a region, or update the existing one with the same code.
#[utoipa::path(
    put,
    path = "/v1/regions",
    tag = "Regions",
    request_body = UpsertRegionRequest,
    responses(
        (status = 200, description = "Upserted region", body = Region),
        (status = 400, description = "Invalid payload", body = ApiError)
    )
)]
async fn upsert_region(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<UpsertRegionRequest>,
) -> impl IntoResponse {
    if req.code.trim().is_empty() || req.name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "code and name must be non-empty",
        );
    }
    let now = Utc::now();
    let region = Region {
        id: id::next_id(),
        code: req.code,
        name: req.name,
        population: req.population,
        area_sq_km: req.area_sq_km,
        water_coverage_pct: req.water_coverage_pct,
        sanitation_coverage_pct: req.sanitation_coverage_pct,
        health_facilities_count: req.health_facilities_count,
        created_at: now,
        updated_at: now,
    };
    match state.store.upsert_region(&region).await {
        Ok(region) => success_response(StatusCode::OK, &trace_id, region),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

pub fn region_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_regions, upsert_region))
        .routes(routes!(get_region))
}
