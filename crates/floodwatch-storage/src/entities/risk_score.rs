use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "risk_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub region_id: String,
    pub score_date: Date,
    pub flood_score: f64,
    pub rainfall_score: f64,
    pub case_score: f64,
    pub vulnerability_score: f64,
    pub composite_score: f64,
    pub level: String,
    pub flood_fallback: bool,
    pub rainfall_fallback: bool,
    pub case_fallback: bool,
    pub vulnerability_fallback: bool,
    pub rainfall_7day_mm: Option<f64>,
    pub ndwi: Option<f64>,
    pub recent_cases: i64,
    pub recent_deaths: i64,
    pub algorithm_version: String,
    pub calculated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
