use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::alert_rule::{self, Column, Entity};
use crate::error::Result;
use crate::store::SurveillanceStore;

/// Alert rule row (from the alert_rules table).
///
/// `conditions_json` holds the serialized condition list; the alert crate
/// compiles it into an executable rule at load time.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AlertRuleRow {
    pub id: String,
    pub name: String,
    pub alert_type: String,
    pub region_pattern: String,
    pub severity: String,
    pub enabled: bool,
    pub auto_resolve: bool,
    pub conditions_json: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_row(m: alert_rule::Model) -> AlertRuleRow {
    AlertRuleRow {
        id: m.id,
        name: m.name,
        alert_type: m.alert_type,
        region_pattern: m.region_pattern,
        severity: m.severity,
        enabled: m.enabled,
        auto_resolve: m.auto_resolve,
        conditions_json: m.conditions_json,
        source: m.source,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl SurveillanceStore {
    pub async fn insert_alert_rule(&self, row: &AlertRuleRow) -> Result<AlertRuleRow> {
        let now = Utc::now().fixed_offset();
        let am = alert_rule::ActiveModel {
            id: Set(row.id.clone()),
            name: Set(row.name.clone()),
            alert_type: Set(row.alert_type.clone()),
            region_pattern: Set(row.region_pattern.clone()),
            severity: Set(row.severity.clone()),
            enabled: Set(row.enabled),
            auto_resolve: Set(row.auto_resolve),
            conditions_json: Set(row.conditions_json.clone()),
            source: Set(row.source.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn get_alert_rule_by_id(&self, id: &str) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_row))
    }

    pub async fn list_alert_rules(
        &self,
        alert_type: Option<&str>,
        enabled: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRuleRow>> {
        let mut q = Entity::find();
        if let Some(at) = alert_type {
            q = q.filter(Column::AlertType.eq(at));
        }
        if let Some(en) = enabled {
            q = q.filter(Column::Enabled.eq(en));
        }
        let rows = q
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn count_alert_rules(
        &self,
        alert_type: Option<&str>,
        enabled: Option<bool>,
    ) -> Result<u64> {
        let mut q = Entity::find();
        if let Some(at) = alert_type {
            q = q.filter(Column::AlertType.eq(at));
        }
        if let Some(en) = enabled {
            q = q.filter(Column::Enabled.eq(en));
        }
        Ok(q.count(self.db()).await?)
    }

    pub async fn update_alert_rule(
        &self,
        id: &str,
        row: &AlertRuleRow,
    ) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let now = Utc::now().fixed_offset();
            let mut am: alert_rule::ActiveModel = m.into();
            am.name = Set(row.name.clone());
            am.alert_type = Set(row.alert_type.clone());
            am.region_pattern = Set(row.region_pattern.clone());
            am.severity = Set(row.severity.clone());
            am.enabled = Set(row.enabled);
            am.auto_resolve = Set(row.auto_resolve);
            am.conditions_json = Set(row.conditions_json.clone());
            am.updated_at = Set(now);
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_alert_rule(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn set_alert_rule_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let now = Utc::now().fixed_offset();
            let mut am: alert_rule::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(now);
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn list_enabled_alert_rules(&self) -> Result<Vec<AlertRuleRow>> {
        let rows = Entity::find()
            .filter(Column::Enabled.eq(true))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }
}
