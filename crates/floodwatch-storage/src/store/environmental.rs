use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use floodwatch_common::id;
use floodwatch_common::types::EnvironmentalObservation;

use crate::entities::environmental_observation::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SurveillanceStore;

fn to_domain(m: environmental_observation::Model) -> EnvironmentalObservation {
    EnvironmentalObservation {
        region_id: m.region_id,
        observation_date: m.observation_date,
        rainfall_mm: m.rainfall_mm,
        rainfall_7day_mm: m.rainfall_7day_mm,
        rainfall_30day_mm: m.rainfall_30day_mm,
        ndwi: m.ndwi,
        ndvi: m.ndvi,
        flood_extent_pct: m.flood_extent_pct,
        flood_observed: m.flood_observed,
        land_surface_temp: m.land_surface_temp,
        data_source: m.data_source,
    }
}

fn check_range(name: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v < min || v > max {
            return Err(StorageError::InvalidMetric {
                reason: format!("{name} out of range [{min}, {max}]: {v}"),
            });
        }
    }
    Ok(())
}

fn validate(obs: &EnvironmentalObservation) -> Result<()> {
    check_range("rainfall_mm", obs.rainfall_mm, 0.0, 10_000.0)?;
    check_range("rainfall_7day_mm", obs.rainfall_7day_mm, 0.0, 10_000.0)?;
    check_range("rainfall_30day_mm", obs.rainfall_30day_mm, 0.0, 10_000.0)?;
    check_range("ndwi", obs.ndwi, -1.0, 1.0)?;
    check_range("ndvi", obs.ndvi, -1.0, 1.0)?;
    check_range("flood_extent_pct", obs.flood_extent_pct, 0.0, 100.0)?;
    Ok(())
}

impl SurveillanceStore {
    /// Writes one observation, overwriting any existing row for the same
    /// (region, date) key. Corrections and backfill reuse the same path.
    pub async fn upsert_environmental(
        &self,
        obs: &EnvironmentalObservation,
    ) -> Result<EnvironmentalObservation> {
        self.require_region(&obs.region_id).await?;
        validate(obs)?;

        let now = Utc::now().fixed_offset();
        let existing = Entity::find()
            .filter(Column::RegionId.eq(obs.region_id.as_str()))
            .filter(Column::ObservationDate.eq(obs.observation_date))
            .one(self.db())
            .await?;
        let model = if let Some(m) = existing {
            let mut am: environmental_observation::ActiveModel = m.into();
            am.rainfall_mm = Set(obs.rainfall_mm);
            am.rainfall_7day_mm = Set(obs.rainfall_7day_mm);
            am.rainfall_30day_mm = Set(obs.rainfall_30day_mm);
            am.ndwi = Set(obs.ndwi);
            am.ndvi = Set(obs.ndvi);
            am.flood_extent_pct = Set(obs.flood_extent_pct);
            am.flood_observed = Set(obs.flood_observed);
            am.land_surface_temp = Set(obs.land_surface_temp);
            am.data_source = Set(obs.data_source.clone());
            am.updated_at = Set(now);
            am.update(self.db()).await?
        } else {
            let am = environmental_observation::ActiveModel {
                id: Set(id::next_id()),
                region_id: Set(obs.region_id.clone()),
                observation_date: Set(obs.observation_date),
                rainfall_mm: Set(obs.rainfall_mm),
                rainfall_7day_mm: Set(obs.rainfall_7day_mm),
                rainfall_30day_mm: Set(obs.rainfall_30day_mm),
                ndwi: Set(obs.ndwi),
                ndvi: Set(obs.ndvi),
                flood_extent_pct: Set(obs.flood_extent_pct),
                flood_observed: Set(obs.flood_observed),
                land_surface_temp: Set(obs.land_surface_temp),
                data_source: Set(obs.data_source.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(self.db()).await?
        };
        Ok(to_domain(model))
    }

    /// Observations for one region in `[from, to]`, ascending by date.
    /// The score calculator reads its lookback windows through here.
    pub async fn query_environmental_range(
        &self,
        region_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EnvironmentalObservation>> {
        let rows = Entity::find()
            .filter(Column::RegionId.eq(region_id))
            .filter(Column::ObservationDate.gte(from))
            .filter(Column::ObservationDate.lte(to))
            .order_by(Column::ObservationDate, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn list_environmental(
        &self,
        region_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EnvironmentalObservation>> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(f) = from {
            q = q.filter(Column::ObservationDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ObservationDate.lte(t));
        }
        let rows = q
            .order_by(Column::ObservationDate, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn count_environmental(
        &self,
        region_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<u64> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(f) = from {
            q = q.filter(Column::ObservationDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ObservationDate.lte(t));
        }
        Ok(q.count(self.db()).await?)
    }
}
