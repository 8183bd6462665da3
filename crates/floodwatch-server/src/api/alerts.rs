use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use floodwatch_alert::Condition;
use floodwatch_common::id;
use floodwatch_common::types::{Alert, AlertState, Severity};
use floodwatch_storage::{AlertFilter, AlertRuleRow, AlertSummary};

use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error_response, success_empty_response, success_paginated_response,
    success_response, ApiError,
};
use crate::logging::TraceId;
use crate::rule_builder::reload_alert_engine;
use crate::state::AppState;

// ---- Alert queries ----

// GET /v1/alerts
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct AlertQueryParams {
    /// Exact region id match (optional)
    #[param(required = false)]
    #[serde(rename = "region_id__eq")]
    region_id_eq: Option<String>,
    /// Alert type match (optional)
    #[param(required = false)]
    #[serde(rename = "alert_type__eq")]
    alert_type_eq: Option<String>,
    /// Severity match: info / warning / critical (optional)
    #[param(required = false)]
    #[serde(rename = "severity__eq")]
    severity_eq: Option<String>,
    /// Lifecycle state match: open / acknowledged / resolved (optional)
    #[param(required = false)]
    #[serde(rename = "state__eq")]
    state_eq: Option<String>,
    /// `true` selects unresolved alerts regardless of acknowledgement
    #[param(required = false)]
    active: Option<bool>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    limit: Option<u64>,
    /// Page offset (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    offset: Option<u64>,
}

fn parse_filter(params: &AlertQueryParams, trace_id: &str) -> Result<AlertFilter, Response> {
    let severity = match params.severity_eq.as_deref() {
        None => None,
        Some(raw) => Some(raw.parse::<Severity>().map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                trace_id,
                "bad_request",
                &format!("unknown severity: {raw}"),
            )
        })?),
    };
    let state = match params.state_eq.as_deref() {
        None => None,
        Some(raw) => Some(raw.parse::<AlertState>().map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                trace_id,
                "bad_request",
                &format!("unknown alert state: {raw}"),
            )
        })?),
    };
    Ok(AlertFilter {
        region_id: params.region_id_eq.clone(),
        alert_type: params.alert_type_eq.clone(),
        severity,
        state,
        active: params.active,
    })
}

/// List alerts, newest first.
#[utoipa::path(
    get,
    path = "/v1/alerts",
    tag = "Alerts",
    params(AlertQueryParams),
    responses(
        (status = 200, description = "Paginated alert list"),
        (status = 400, description = "Unknown filter value", body = ApiError)
    )
)]
async fn list_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<AlertQueryParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let filter = match parse_filter(&params, &trace_id) {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };

    let total = match state.store.count_alerts(&filter).await {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state.store.list_alerts(&filter, limit, offset).await {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Active-alert counts grouped by severity, type, and region.
#[utoipa::path(
    get,
    path = "/v1/alerts/summary",
    tag = "Alerts",
    responses(
        (status = 200, description = "Alert summary", body = AlertSummary)
    )
)]
async fn alert_summary(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.alert_summary().await {
        Ok(summary) => success_response(StatusCode::OK, &trace_id, summary),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Fetch a single alert by id.
#[utoipa::path(
    get,
    path = "/v1/alerts/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert", body = Alert),
        (status = 404, description = "Alert not found", body = ApiError)
    )
)]
async fn get_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_alert_by_id(&id).await {
        Ok(Some(alert)) => success_response(StatusCode::OK, &trace_id, alert),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("alert {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

// ---- Lifecycle transitions ----

#[derive(Deserialize, ToSchema)]
pub struct AcknowledgeRequest {
    /// Operator acknowledging the alert
    pub acknowledged_by: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct ResolveRequest {
    /// Resolution note; defaults to "manual"
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Acknowledge an alert. Idempotent: re-acknowledging keeps the
/// original operator and timestamp. Acknowledging a resolved alert
/// is rejected with 409.
#[utoipa::path(
    post,
    path = "/v1/alerts/{id}/acknowledge",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert id")),
    request_body = AcknowledgeRequest,
    responses(
        (status = 200, description = "Acknowledged alert", body = Alert),
        (status = 404, description = "Alert not found", body = ApiError),
        (status = 409, description = "Alert already resolved", body = ApiError)
    )
)]
async fn acknowledge_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AcknowledgeRequest>,
) -> impl IntoResponse {
    if req.acknowledged_by.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "acknowledged_by must be non-empty",
        );
    }
    match state.store.acknowledge_alert(&id, &req.acknowledged_by).await {
        Ok(alert) => success_response(StatusCode::OK, &trace_id, alert),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Resolve an alert. Idempotent: resolving a resolved alert keeps the
/// original resolution and timestamp.
#[utoipa::path(
    post,
    path = "/v1/alerts/{id}/resolve",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert id")),
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolved alert", body = Alert),
        (status = 404, description = "Alert not found", body = ApiError)
    )
)]
async fn resolve_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ResolveRequest>>,
) -> impl IntoResponse {
    let resolution = body
        .and_then(|Json(req)| req.resolution)
        .unwrap_or_else(|| "manual".to_string());
    match state.store.resolve_alert(&id, &resolution).await {
        Ok(alert) => success_response(StatusCode::OK, &trace_id, alert),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

// ---- Rule CRUD ----

// GET /v1/alerts/rules
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct RuleQueryParams {
    /// Alert type match (optional)
    #[param(required = false)]
    #[serde(rename = "alert_type__eq")]
    alert_type_eq: Option<String>,
    /// Enabled flag match (optional)
    #[param(required = false)]
    #[serde(rename = "enabled__eq")]
    enabled_eq: Option<bool>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    limit: Option<u64>,
    /// Page offset (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    offset: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRuleRequest {
    pub name: String,
    pub alert_type: String,
    /// Glob over region codes; "*" matches every region
    #[serde(default = "default_region_pattern")]
    pub region_pattern: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_resolve: bool,
    /// Condition list (JSON array, conjunction)
    pub conditions: serde_json::Value,
}

/// Partial rule update; omitted fields keep current values.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateRuleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub region_pattern: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub auto_resolve: Option<bool>,
    #[serde(default)]
    pub conditions: Option<serde_json::Value>,
}

#[derive(Deserialize, ToSchema)]
pub struct EnableRuleRequest {
    pub enabled: bool,
}

fn default_region_pattern() -> String {
    "*".to_string()
}

fn default_severity() -> String {
    "warning".to_string()
}

fn default_true() -> bool {
    true
}

/// Rejects payloads the engine could not compile later.
fn validate_rule_fields(
    trace_id: &str,
    severity: &str,
    conditions: &serde_json::Value,
) -> Result<String, Response> {
    if severity.parse::<Severity>().is_err() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            trace_id,
            "invalid_rule",
            &format!("unknown severity: {severity}"),
        ));
    }
    let parsed: Vec<Condition> = match serde_json::from_value(conditions.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                trace_id,
                "invalid_rule",
                &format!("invalid conditions: {e}"),
            ))
        }
    };
    if parsed.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            trace_id,
            "invalid_rule",
            "conditions must be a non-empty array",
        ));
    }
    match serde_json::to_string(conditions) {
        Ok(json) => Ok(json),
        Err(e) => Err(error_response(
            StatusCode::BAD_REQUEST,
            trace_id,
            "invalid_rule",
            &format!("invalid conditions: {e}"),
        )),
    }
}

/// List alert rules.
#[utoipa::path(
    get,
    path = "/v1/alerts/rules",
    tag = "Alerts",
    params(RuleQueryParams),
    responses(
        (status = 200, description = "Paginated rule list")
    )
)]
async fn list_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<RuleQueryParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let alert_type = params.alert_type_eq.as_deref();

    let total = match state.store.count_alert_rules(alert_type, params.enabled_eq).await {
        Ok(n) => n,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    match state
        .store
        .list_alert_rules(alert_type, params.enabled_eq, limit, offset)
        .await
    {
        Ok(items) => success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Create an alert rule and reload the engine.
#[utoipa::path(
    post,
    path = "/v1/alerts/rules",
    tag = "Alerts",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Created rule", body = AlertRuleRow),
        (status = 400, description = "Invalid rule", body = ApiError)
    )
)]
async fn create_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() || req.alert_type.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "invalid_rule",
            "name and alert_type must be non-empty",
        );
    }
    let conditions_json = match validate_rule_fields(&trace_id, &req.severity, &req.conditions) {
        Ok(json) => json,
        Err(resp) => return resp,
    };

    let row = AlertRuleRow {
        id: id::next_id(),
        name: req.name,
        alert_type: req.alert_type,
        region_pattern: req.region_pattern,
        severity: req.severity,
        enabled: req.enabled,
        auto_resolve: req.auto_resolve,
        conditions_json,
        source: "api".to_string(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let created = match state.store.insert_alert_rule(&row).await {
        Ok(created) => created,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    if let Err(e) = reload_alert_engine(&state.store, &state.alert_engine).await {
        return storage_error_response(&trace_id, e);
    }
    success_response(StatusCode::CREATED, &trace_id, created)
}

/// Fetch a single rule by id.
#[utoipa::path(
    get,
    path = "/v1/alerts/rules/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Rule", body = AlertRuleRow),
        (status = 404, description = "Rule not found", body = ApiError)
    )
)]
async fn get_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_alert_rule_by_id(&id).await {
        Ok(Some(rule)) => success_response(StatusCode::OK, &trace_id, rule),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("rule {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Update an alert rule and reload the engine.
#[utoipa::path(
    put,
    path = "/v1/alerts/rules/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Rule id")),
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, description = "Updated rule", body = AlertRuleRow),
        (status = 400, description = "Invalid rule", body = ApiError),
        (status = 404, description = "Rule not found", body = ApiError)
    )
)]
async fn update_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    let mut row = match state.store.get_alert_rule_by_id(&id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                &format!("rule {id} not found"),
            )
        }
        Err(e) => return storage_error_response(&trace_id, e),
    };

    if let Some(name) = req.name {
        row.name = name;
    }
    if let Some(alert_type) = req.alert_type {
        row.alert_type = alert_type;
    }
    if let Some(pattern) = req.region_pattern {
        row.region_pattern = pattern;
    }
    if let Some(severity) = req.severity {
        row.severity = severity;
    }
    if let Some(enabled) = req.enabled {
        row.enabled = enabled;
    }
    if let Some(auto_resolve) = req.auto_resolve {
        row.auto_resolve = auto_resolve;
    }
    if let Some(conditions) = &req.conditions {
        row.conditions_json = match validate_rule_fields(&trace_id, &row.severity, conditions) {
            Ok(json) => json,
            Err(resp) => return resp,
        };
    } else if row.severity.parse::<Severity>().is_err() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "invalid_rule",
            &format!("unknown severity: {}", row.severity),
        );
    }

    let updated = match state.store.update_alert_rule(&id, &row).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                &format!("rule {id} not found"),
            )
        }
        Err(e) => return storage_error_response(&trace_id, e),
    };
    if let Err(e) = reload_alert_engine(&state.store, &state.alert_engine).await {
        return storage_error_response(&trace_id, e);
    }
    success_response(StatusCode::OK, &trace_id, updated)
}

/// Delete an alert rule and reload the engine. Alerts the rule opened
/// remain and can still be acknowledged or resolved.
#[utoipa::path(
    delete,
    path = "/v1/alerts/rules/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Rule deleted"),
        (status = 404, description = "Rule not found", body = ApiError)
    )
)]
async fn delete_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_alert_rule(&id).await {
        Ok(true) => {
            if let Err(e) = reload_alert_engine(&state.store, &state.alert_engine).await {
                return storage_error_response(&trace_id, e);
            }
            success_empty_response(StatusCode::OK, &trace_id, "rule deleted")
        }
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("rule {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Enable or disable an alert rule and reload the engine.
#[utoipa::path(
    put,
    path = "/v1/alerts/rules/{id}/enable",
    tag = "Alerts",
    params(("id" = String, Path, description = "Rule id")),
    request_body = EnableRuleRequest,
    responses(
        (status = 200, description = "Updated rule", body = AlertRuleRow),
        (status = 404, description = "Rule not found", body = ApiError)
    )
)]
async fn enable_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnableRuleRequest>,
) -> impl IntoResponse {
    match state.store.set_alert_rule_enabled(&id, req.enabled).await {
        Ok(Some(rule)) => {
            if let Err(e) = reload_alert_engine(&state.store, &state.alert_engine).await {
                return storage_error_response(&trace_id, e);
            }
            success_response(StatusCode::OK, &trace_id, rule)
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("rule {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

pub fn alert_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_alerts))
        .routes(routes!(alert_summary))
        .routes(routes!(list_rules, create_rule))
        .routes(routes!(get_rule, update_rule, delete_rule))
        .routes(routes!(enable_rule))
        .routes(routes!(get_alert))
        .routes(routes!(acknowledge_alert))
        .routes(routes!(resolve_alert))
}
