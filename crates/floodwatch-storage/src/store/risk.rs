use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use floodwatch_common::id;
use floodwatch_common::types::{RiskLevel, RiskScore};

use crate::entities::risk_score::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SurveillanceStore;

fn to_domain(m: risk_score::Model) -> Result<RiskScore> {
    let level: RiskLevel = m
        .level
        .parse()
        .map_err(|_| StorageError::InvalidColumn {
            column: "risk_scores.level",
            value: m.level.clone(),
        })?;
    Ok(RiskScore {
        region_id: m.region_id,
        score_date: m.score_date,
        flood_score: m.flood_score,
        rainfall_score: m.rainfall_score,
        case_score: m.case_score,
        vulnerability_score: m.vulnerability_score,
        composite_score: m.composite_score,
        level,
        flood_fallback: m.flood_fallback,
        rainfall_fallback: m.rainfall_fallback,
        case_fallback: m.case_fallback,
        vulnerability_fallback: m.vulnerability_fallback,
        rainfall_7day_mm: m.rainfall_7day_mm,
        ndwi: m.ndwi,
        recent_cases: m.recent_cases,
        recent_deaths: m.recent_deaths,
        algorithm_version: m.algorithm_version,
        calculated_at: m.calculated_at.with_timezone(&Utc),
    })
}

impl SurveillanceStore {
    /// Persists a computed score, overwriting any prior row for the same
    /// (region, score_date) key. Recomputing a date is idempotent.
    pub async fn upsert_risk_score(&self, score: &RiskScore) -> Result<RiskScore> {
        let existing = Entity::find()
            .filter(Column::RegionId.eq(score.region_id.as_str()))
            .filter(Column::ScoreDate.eq(score.score_date))
            .one(self.db())
            .await?;
        let calculated_at = score.calculated_at.fixed_offset();
        let model = if let Some(m) = existing {
            let mut am: risk_score::ActiveModel = m.into();
            am.flood_score = Set(score.flood_score);
            am.rainfall_score = Set(score.rainfall_score);
            am.case_score = Set(score.case_score);
            am.vulnerability_score = Set(score.vulnerability_score);
            am.composite_score = Set(score.composite_score);
            am.level = Set(score.level.to_string());
            am.flood_fallback = Set(score.flood_fallback);
            am.rainfall_fallback = Set(score.rainfall_fallback);
            am.case_fallback = Set(score.case_fallback);
            am.vulnerability_fallback = Set(score.vulnerability_fallback);
            am.rainfall_7day_mm = Set(score.rainfall_7day_mm);
            am.ndwi = Set(score.ndwi);
            am.recent_cases = Set(score.recent_cases);
            am.recent_deaths = Set(score.recent_deaths);
            am.algorithm_version = Set(score.algorithm_version.clone());
            am.calculated_at = Set(calculated_at);
            am.update(self.db()).await?
        } else {
            let am = risk_score::ActiveModel {
                id: Set(id::next_id()),
                region_id: Set(score.region_id.clone()),
                score_date: Set(score.score_date),
                flood_score: Set(score.flood_score),
                rainfall_score: Set(score.rainfall_score),
                case_score: Set(score.case_score),
                vulnerability_score: Set(score.vulnerability_score),
                composite_score: Set(score.composite_score),
                level: Set(score.level.to_string()),
                flood_fallback: Set(score.flood_fallback),
                rainfall_fallback: Set(score.rainfall_fallback),
                case_fallback: Set(score.case_fallback),
                vulnerability_fallback: Set(score.vulnerability_fallback),
                rainfall_7day_mm: Set(score.rainfall_7day_mm),
                ndwi: Set(score.ndwi),
                recent_cases: Set(score.recent_cases),
                recent_deaths: Set(score.recent_deaths),
                algorithm_version: Set(score.algorithm_version.clone()),
                calculated_at: Set(calculated_at),
            };
            am.insert(self.db()).await?
        };
        to_domain(model)
    }

    pub async fn get_risk_score(
        &self,
        region_id: &str,
        score_date: NaiveDate,
    ) -> Result<Option<RiskScore>> {
        let model = Entity::find()
            .filter(Column::RegionId.eq(region_id))
            .filter(Column::ScoreDate.eq(score_date))
            .one(self.db())
            .await?;
        model.map(to_domain).transpose()
    }

    pub async fn list_risk_scores(
        &self,
        region_id: Option<&str>,
        level: Option<RiskLevel>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RiskScore>> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(lv) = level {
            q = q.filter(Column::Level.eq(lv.to_string()));
        }
        if let Some(f) = from {
            q = q.filter(Column::ScoreDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ScoreDate.lte(t));
        }
        let rows = q
            .order_by(Column::ScoreDate, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn count_risk_scores(
        &self,
        region_id: Option<&str>,
        level: Option<RiskLevel>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<u64> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(lv) = level {
            q = q.filter(Column::Level.eq(lv.to_string()));
        }
        if let Some(f) = from {
            q = q.filter(Column::ScoreDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ScoreDate.lte(t));
        }
        Ok(q.count(self.db()).await?)
    }

    /// The most recent score per region, ordered by region code.
    ///
    /// Region counts are small (dozens of LGAs), so one lookup per region
    /// is cheaper to maintain than a correlated subquery.
    pub async fn latest_risk_scores(&self) -> Result<Vec<RiskScore>> {
        let regions = self.list_all_regions().await?;
        let mut out = Vec::with_capacity(regions.len());
        for region in regions {
            let model = Entity::find()
                .filter(Column::RegionId.eq(region.id.as_str()))
                .order_by(Column::ScoreDate, Order::Desc)
                .one(self.db())
                .await?;
            if let Some(m) = model {
                out.push(to_domain(m)?);
            }
        }
        Ok(out)
    }

    /// Up to `limit` scores for one region at or before `up_to`, most
    /// recent first. Consecutive-level alert conditions read this.
    pub async fn level_history(
        &self,
        region_id: &str,
        up_to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<RiskScore>> {
        let rows = Entity::find()
            .filter(Column::RegionId.eq(region_id))
            .filter(Column::ScoreDate.lte(up_to))
            .order_by(Column::ScoreDate, Order::Desc)
            .limit(limit as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_domain).collect()
    }
}
