use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DOWN_SQL).await?;
        Ok(())
    }
}

const UP_SQL: &str = "
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS regions (
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    population INTEGER,
    area_sq_km REAL,
    water_coverage_pct REAL,
    sanitation_coverage_pct REAL,
    health_facilities_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_regions_code ON regions(code);

CREATE TABLE IF NOT EXISTS environmental_observations (
    id TEXT PRIMARY KEY NOT NULL,
    region_id TEXT NOT NULL,
    observation_date TEXT NOT NULL,
    rainfall_mm REAL,
    rainfall_7day_mm REAL,
    rainfall_30day_mm REAL,
    ndwi REAL,
    ndvi REAL,
    flood_extent_pct REAL,
    flood_observed INTEGER NOT NULL DEFAULT 0,
    land_surface_temp REAL,
    data_source TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(region_id, observation_date)
);
CREATE INDEX IF NOT EXISTS idx_env_obs_region_date
    ON environmental_observations(region_id, observation_date);

CREATE TABLE IF NOT EXISTS case_reports (
    id TEXT PRIMARY KEY NOT NULL,
    region_id TEXT NOT NULL,
    report_date TEXT NOT NULL,
    new_cases INTEGER NOT NULL DEFAULT 0,
    deaths INTEGER NOT NULL DEFAULT 0,
    suspected_cases INTEGER NOT NULL DEFAULT 0,
    confirmed_cases INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(region_id, report_date)
);
CREATE INDEX IF NOT EXISTS idx_case_reports_region_date
    ON case_reports(region_id, report_date);

CREATE TABLE IF NOT EXISTS risk_scores (
    id TEXT PRIMARY KEY NOT NULL,
    region_id TEXT NOT NULL,
    score_date TEXT NOT NULL,
    flood_score REAL NOT NULL,
    rainfall_score REAL NOT NULL,
    case_score REAL NOT NULL,
    vulnerability_score REAL NOT NULL,
    composite_score REAL NOT NULL,
    level TEXT NOT NULL,
    flood_fallback INTEGER NOT NULL DEFAULT 0,
    rainfall_fallback INTEGER NOT NULL DEFAULT 0,
    case_fallback INTEGER NOT NULL DEFAULT 0,
    vulnerability_fallback INTEGER NOT NULL DEFAULT 0,
    rainfall_7day_mm REAL,
    ndwi REAL,
    recent_cases INTEGER NOT NULL DEFAULT 0,
    recent_deaths INTEGER NOT NULL DEFAULT 0,
    algorithm_version TEXT NOT NULL,
    calculated_at TEXT NOT NULL,
    UNIQUE(region_id, score_date)
);
CREATE INDEX IF NOT EXISTS idx_risk_scores_region_date
    ON risk_scores(region_id, score_date);
CREATE INDEX IF NOT EXISTS idx_risk_scores_date ON risk_scores(score_date);

CREATE TABLE IF NOT EXISTS alert_rules (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    alert_type TEXT NOT NULL,
    region_pattern TEXT NOT NULL DEFAULT '*',
    severity TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    auto_resolve INTEGER NOT NULL DEFAULT 1,
    conditions_json TEXT NOT NULL,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alert_rules_enabled ON alert_rules(enabled);

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY NOT NULL,
    region_id TEXT NOT NULL,
    rule_id TEXT NOT NULL,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    level TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    triggered_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    acknowledged_at TEXT,
    acknowledged_by TEXT,
    resolved_at TEXT,
    resolution TEXT,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alerts_region_type ON alerts(region_id, alert_type);
CREATE INDEX IF NOT EXISTS idx_alerts_created_at ON alerts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_alerts_resolved_at ON alerts(resolved_at);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS alerts;
DROP TABLE IF EXISTS alert_rules;
DROP TABLE IF EXISTS risk_scores;
DROP TABLE IF EXISTS case_reports;
DROP TABLE IF EXISTS environmental_observations;
DROP TABLE IF EXISTS regions;
";
