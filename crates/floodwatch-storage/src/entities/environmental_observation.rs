use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "environmental_observations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub region_id: String,
    pub observation_date: Date,
    pub rainfall_mm: Option<f64>,
    pub rainfall_7day_mm: Option<f64>,
    pub rainfall_30day_mm: Option<f64>,
    pub ndwi: Option<f64>,
    pub ndvi: Option<f64>,
    pub flood_extent_pct: Option<f64>,
    pub flood_observed: bool,
    pub land_surface_temp: Option<f64>,
    pub data_source: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
