pub mod alerts;
pub mod observations;
pub mod pagination;
pub mod regions;
pub mod risk_scores;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use floodwatch_storage::StorageError;

/// API error response
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub err_code: i32,
    /// Error message
    pub err_msg: String,
    /// Trace ID (empty string by default)
    pub trace_id: String,
}

/// Uniform API response envelope
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Error code (0 on success)
    pub err_code: i32,
    /// Error message ("success" on success)
    pub err_msg: String,
    /// Trace ID (empty string by default)
    pub trace_id: String,
    /// Payload, present when the operation returns data
    pub data: Option<T>,
}

/// Paginated payload
#[derive(Serialize, ToSchema)]
pub struct PaginatedData<T>
where
    T: Serialize,
{
    /// Items on this page
    pub items: Vec<T>,
    /// Total matching rows
    pub total: u64,
    /// Page size
    pub limit: usize,
    /// Page offset
    pub offset: usize,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: 0,
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

pub fn success_paginated_response<T>(
    status: StatusCode,
    trace_id: &str,
    items: Vec<T>,
    total: u64,
    limit: usize,
    offset: usize,
) -> Response
where
    T: Serialize,
{
    success_response(
        status,
        trace_id,
        PaginatedData {
            items,
            total,
            limit,
            offset,
        },
    )
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "conflict" => 1005,
        "unknown_region" => 1102,
        "invalid_metric" => 1103,
        "invalid_rule" => 1104,
        "recompute_in_progress" => 1105,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Maps store failures onto the HTTP surface. Validation problems are the
/// caller's fault (4xx); everything else is reported as a storage error.
pub fn storage_error_response(trace_id: &str, err: StorageError) -> Response {
    let msg = err.to_string();
    match err {
        StorageError::UnknownRegion { .. } => {
            error_response(StatusCode::NOT_FOUND, trace_id, "unknown_region", &msg)
        }
        StorageError::InvalidMetric { .. } => {
            error_response(StatusCode::BAD_REQUEST, trace_id, "invalid_metric", &msg)
        }
        StorageError::NotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, trace_id, "not_found", &msg)
        }
        StorageError::IllegalTransition { .. } => {
            error_response(StatusCode::CONFLICT, trace_id, "conflict", &msg)
        }
        StorageError::Db(_) | StorageError::Json(_) | StorageError::InvalidColumn { .. } => {
            tracing::error!(trace_id = %trace_id, error = %msg, "Storage failure");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                trace_id,
                "storage_error",
                &msg,
            )
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Service version
    version: String,
    /// Uptime in seconds
    uptime_secs: i64,
    /// Registered regions
    region_count: u64,
    /// Storage status
    storage_status: String,
}

/// Service health status.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    let (region_count, storage_status) = match state.store.count_regions().await {
        Ok(count) => (count, "ok".to_string()),
        Err(e) => (0, format!("error: {e}")),
    };
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            region_count,
            storage_status,
        },
    )
}

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(regions::region_routes())
        .merge(observations::observation_routes())
        .merge(risk_scores::risk_score_routes())
        .merge(alerts::alert_routes())
}
