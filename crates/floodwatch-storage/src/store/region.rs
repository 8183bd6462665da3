use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use floodwatch_common::types::Region;

use crate::entities::region::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SurveillanceStore;

fn to_domain(m: region::Model) -> Region {
    Region {
        id: m.id,
        code: m.code,
        name: m.name,
        population: m.population,
        area_sq_km: m.area_sq_km,
        water_coverage_pct: m.water_coverage_pct,
        sanitation_coverage_pct: m.sanitation_coverage_pct,
        health_facilities_count: m.health_facilities_count,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl SurveillanceStore {
    /// Inserts a region, or updates the existing row with the same code.
    /// Seeding runs through here so re-running the seed is harmless.
    pub async fn upsert_region(&self, r: &Region) -> Result<Region> {
        let now = Utc::now().fixed_offset();
        let existing = Entity::find()
            .filter(Column::Code.eq(r.code.as_str()))
            .one(self.db())
            .await?;
        let model = if let Some(m) = existing {
            let mut am: region::ActiveModel = m.into();
            am.name = Set(r.name.clone());
            am.population = Set(r.population);
            am.area_sq_km = Set(r.area_sq_km);
            am.water_coverage_pct = Set(r.water_coverage_pct);
            am.sanitation_coverage_pct = Set(r.sanitation_coverage_pct);
            am.health_facilities_count = Set(r.health_facilities_count);
            am.updated_at = Set(now);
            am.update(self.db()).await?
        } else {
            let am = region::ActiveModel {
                id: Set(r.id.clone()),
                code: Set(r.code.clone()),
                name: Set(r.name.clone()),
                population: Set(r.population),
                area_sq_km: Set(r.area_sq_km),
                water_coverage_pct: Set(r.water_coverage_pct),
                sanitation_coverage_pct: Set(r.sanitation_coverage_pct),
                health_facilities_count: Set(r.health_facilities_count),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(self.db()).await?
        };
        Ok(to_domain(model))
    }

    pub async fn get_region(&self, id: &str) -> Result<Option<Region>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_domain))
    }

    pub async fn get_region_by_code(&self, code: &str) -> Result<Option<Region>> {
        let model = Entity::find()
            .filter(Column::Code.eq(code))
            .one(self.db())
            .await?;
        Ok(model.map(to_domain))
    }

    /// Looks up a region, mapping absence to a typed error. Observation
    /// writes and recompute both go through here.
    pub async fn require_region(&self, id: &str) -> Result<Region> {
        self.get_region(id).await?.ok_or(StorageError::UnknownRegion {
            region_id: id.to_string(),
        })
    }

    pub async fn list_regions(&self, limit: usize, offset: usize) -> Result<Vec<Region>> {
        let rows = Entity::find()
            .order_by(Column::Code, Order::Asc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn list_all_regions(&self) -> Result<Vec<Region>> {
        let rows = Entity::find()
            .order_by(Column::Code, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn count_regions(&self) -> Result<u64> {
        Ok(Entity::find().count(self.db()).await?)
    }
}
