use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use floodwatch_common::types::{Alert, AlertState, RiskLevel, Severity};

use crate::entities::alert::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SurveillanceStore;

/// List filter for alert queries. `active` selects unresolved alerts
/// regardless of acknowledgement.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub region_id: Option<String>,
    pub alert_type: Option<String>,
    pub severity: Option<Severity>,
    pub state: Option<AlertState>,
    pub active: Option<bool>,
}

/// Active-alert counts grouped by severity, type, and region.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct AlertSummary {
    pub total: u64,
    pub active_count: u64,
    pub resolved_count: u64,
    pub by_severity: HashMap<String, u64>,
    pub by_type: HashMap<String, u64>,
    pub by_region: HashMap<String, u64>,
}

fn state_of(m: &alert::Model) -> AlertState {
    if m.resolved_at.is_some() {
        AlertState::Resolved
    } else if m.acknowledged_at.is_some() {
        AlertState::Acknowledged
    } else {
        AlertState::Open
    }
}

fn to_domain(m: alert::Model) -> Result<Alert> {
    let severity: Severity = m.severity.parse().map_err(|_| StorageError::InvalidColumn {
        column: "alerts.severity",
        value: m.severity.clone(),
    })?;
    let level: RiskLevel = m.level.parse().map_err(|_| StorageError::InvalidColumn {
        column: "alerts.level",
        value: m.level.clone(),
    })?;
    let triggered_by: serde_json::Value = serde_json::from_str(&m.triggered_by)?;
    let state = state_of(&m);
    Ok(Alert {
        id: m.id,
        region_id: m.region_id,
        rule_id: m.rule_id,
        alert_type: m.alert_type,
        severity,
        level,
        title: m.title,
        message: m.message,
        triggered_by,
        state,
        created_at: m.created_at.with_timezone(&Utc),
        acknowledged_at: m.acknowledged_at.map(|t| t.with_timezone(&Utc)),
        acknowledged_by: m.acknowledged_by,
        resolved_at: m.resolved_at.map(|t| t.with_timezone(&Utc)),
        resolution: m.resolution,
    })
}

fn apply_filter(
    mut q: sea_orm::Select<Entity>,
    filter: &AlertFilter,
) -> sea_orm::Select<Entity> {
    if let Some(rid) = &filter.region_id {
        q = q.filter(Column::RegionId.eq(rid.as_str()));
    }
    if let Some(at) = &filter.alert_type {
        q = q.filter(Column::AlertType.eq(at.as_str()));
    }
    if let Some(sev) = filter.severity {
        q = q.filter(Column::Severity.eq(sev.to_string()));
    }
    if let Some(state) = filter.state {
        q = match state {
            AlertState::Open => q
                .filter(Column::ResolvedAt.is_null())
                .filter(Column::AcknowledgedAt.is_null()),
            AlertState::Acknowledged => q
                .filter(Column::ResolvedAt.is_null())
                .filter(Column::AcknowledgedAt.is_not_null()),
            AlertState::Resolved => q.filter(Column::ResolvedAt.is_not_null()),
        };
    }
    if let Some(active) = filter.active {
        q = if active {
            q.filter(Column::ResolvedAt.is_null())
        } else {
            q.filter(Column::ResolvedAt.is_not_null())
        };
    }
    q
}

impl SurveillanceStore {
    /// Inserts a new alert in the open state. The store sets timestamps;
    /// callers supply the pre-generated id.
    pub async fn insert_alert(&self, a: &Alert) -> Result<Alert> {
        let now = Utc::now().fixed_offset();
        let am = alert::ActiveModel {
            id: Set(a.id.clone()),
            region_id: Set(a.region_id.clone()),
            rule_id: Set(a.rule_id.clone()),
            alert_type: Set(a.alert_type.clone()),
            severity: Set(a.severity.to_string()),
            level: Set(a.level.to_string()),
            title: Set(a.title.clone()),
            message: Set(a.message.clone()),
            triggered_by: Set(serde_json::to_string(&a.triggered_by)?),
            created_at: Set(now),
            acknowledged_at: Set(None),
            acknowledged_by: Set(None),
            resolved_at: Set(None),
            resolution: Set(None),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        to_domain(model)
    }

    pub async fn get_alert_by_id(&self, id: &str) -> Result<Option<Alert>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_domain).transpose()
    }

    /// The unresolved alert for a (region, type) pair, if one exists.
    /// Deduplication in the evaluator hinges on this lookup.
    pub async fn find_unresolved_alert(
        &self,
        region_id: &str,
        alert_type: &str,
    ) -> Result<Option<Alert>> {
        let model = Entity::find()
            .filter(Column::RegionId.eq(region_id))
            .filter(Column::AlertType.eq(alert_type))
            .filter(Column::ResolvedAt.is_null())
            .order_by(Column::CreatedAt, Order::Desc)
            .one(self.db())
            .await?;
        model.map(to_domain).transpose()
    }

    /// Marks an alert acknowledged. Acknowledging an already-acknowledged
    /// alert is a no-op success; acknowledging a resolved alert is an
    /// illegal transition.
    pub async fn acknowledge_alert(&self, id: &str, acknowledged_by: &str) -> Result<Alert> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or(StorageError::NotFound {
                entity: "alert",
                id: id.to_string(),
            })?;
        match state_of(&model) {
            AlertState::Acknowledged => to_domain(model),
            AlertState::Resolved => Err(StorageError::IllegalTransition {
                from: AlertState::Resolved.to_string(),
                to: AlertState::Acknowledged.to_string(),
            }),
            AlertState::Open => {
                let now = Utc::now().fixed_offset();
                let mut am: alert::ActiveModel = model.into();
                am.acknowledged_at = Set(Some(now));
                am.acknowledged_by = Set(Some(acknowledged_by.to_string()));
                am.updated_at = Set(now);
                let updated = am.update(self.db()).await?;
                to_domain(updated)
            }
        }
    }

    /// Marks an alert resolved with the given resolution kind ("manual"
    /// or "auto"). Resolving an already-resolved alert is a no-op success.
    pub async fn resolve_alert(&self, id: &str, resolution: &str) -> Result<Alert> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or(StorageError::NotFound {
                entity: "alert",
                id: id.to_string(),
            })?;
        if state_of(&model) == AlertState::Resolved {
            return to_domain(model);
        }
        let now = Utc::now().fixed_offset();
        let mut am: alert::ActiveModel = model.into();
        am.resolved_at = Set(Some(now));
        am.resolution = Set(Some(resolution.to_string()));
        am.updated_at = Set(now);
        let updated = am.update(self.db()).await?;
        to_domain(updated)
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Alert>> {
        let q = apply_filter(Entity::find(), filter);
        let rows = q
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn count_alerts(&self, filter: &AlertFilter) -> Result<u64> {
        let q = apply_filter(Entity::find(), filter);
        Ok(q.count(self.db()).await?)
    }

    /// Aggregated counts for the dashboard. Grouping runs in memory over
    /// the active set, which stays small thanks to deduplication.
    pub async fn alert_summary(&self) -> Result<AlertSummary> {
        let total = Entity::find().count(self.db()).await?;
        let active_rows = Entity::find()
            .filter(Column::ResolvedAt.is_null())
            .all(self.db())
            .await?;

        let mut by_severity: HashMap<String, u64> = HashMap::new();
        let mut by_type: HashMap<String, u64> = HashMap::new();
        let mut by_region: HashMap<String, u64> = HashMap::new();
        let active_count = active_rows.len() as u64;
        for m in &active_rows {
            *by_severity.entry(m.severity.clone()).or_default() += 1;
            *by_type.entry(m.alert_type.clone()).or_default() += 1;
            *by_region.entry(m.region_id.clone()).or_default() += 1;
        }

        Ok(AlertSummary {
            total,
            active_count,
            resolved_count: total - active_count,
            by_severity,
            by_type,
            by_region,
        })
    }
}
