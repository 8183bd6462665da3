//! Alert rule engine for evaluating region risk snapshots against
//! configurable compound rules.
//!
//! Rules are stored as JSON condition lists, compiled into
//! [`engine::CompiledRule`] values at load time, and evaluated against a
//! per-region [`RegionSnapshot`] after each recompute. A rule fires only
//! when every condition holds (conjunction). The engine reports both
//! fired and cleared outcomes so the caller can open new alerts and
//! auto-resolve stale ones.

pub mod condition;
pub mod engine;


use chrono::NaiveDate;
use floodwatch_common::types::RiskLevel;
use serde_json::json;

pub use condition::{CompareOp, Condition, SignalMetric};
pub use engine::{AlertEngine, AlertTrigger, CompiledRule, RuleOutcome};

/// Everything a rule may inspect for one region on one score date.
///
/// `level_history` is ordered most recent first and includes the current
/// score date, so `history[0]` always equals `level`.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    pub region_id: String,
    pub region_code: String,
    pub region_name: String,
    pub score_date: NaiveDate,
    pub level: RiskLevel,
    pub composite_score: f64,
    pub rainfall_mm: Option<f64>,
    pub rainfall_7day_mm: Option<f64>,
    pub ndwi: Option<f64>,
    pub flood_extent_pct: Option<f64>,
    pub flood_observed: bool,
    pub new_cases: i64,
    pub deaths: i64,
    pub level_history: Vec<RiskLevel>,
}

impl RegionSnapshot {
    /// JSON snapshot stored on alerts as `triggered_by`, so an alert
    /// remains explainable after the underlying rows are recomputed.
    pub fn signals_json(&self) -> serde_json::Value {
        json!({
            "score_date": self.score_date,
            "level": self.level,
            "composite_score": self.composite_score,
            "rainfall_7day_mm": self.rainfall_7day_mm,
            "ndwi": self.ndwi,
            "flood_extent_pct": self.flood_extent_pct,
            "flood_observed": self.flood_observed,
            "new_cases": self.new_cases,
            "deaths": self.deaths,
        })
    }
}
