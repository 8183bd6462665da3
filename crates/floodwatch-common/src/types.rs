use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use floodwatch_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Ordinal risk tier derived from the composite score via configured
/// cut points.
///
/// # Examples
///
/// ```
/// use floodwatch_common::types::RiskLevel;
///
/// let level: RiskLevel = "high".parse().unwrap();
/// assert_eq!(level, RiskLevel::High);
/// assert!(RiskLevel::High > RiskLevel::Low);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("unknown risk level: {s}")),
        }
    }
}

/// Alert lifecycle state.
///
/// Transitions are `open -> acknowledged -> resolved`, with `resolved`
/// also reachable directly from `open`. A resolved alert is terminal;
/// re-triggering the same condition later creates a new alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertState {
    /// Whether the alert still blocks creation of a new alert of the
    /// same (region, type) pair.
    pub fn is_unresolved(self) -> bool {
        !matches!(self, AlertState::Resolved)
    }

    pub fn can_transition_to(self, next: AlertState) -> bool {
        matches!(
            (self, next),
            (AlertState::Open, AlertState::Acknowledged)
                | (AlertState::Open, AlertState::Resolved)
                | (AlertState::Acknowledged, AlertState::Resolved)
        )
    }
}

impl std::str::FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(AlertState::Open),
            "acknowledged" => Ok(AlertState::Acknowledged),
            "resolved" => Ok(AlertState::Resolved),
            _ => Err(format!("unknown alert state: {s}")),
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertState::Open => write!(f, "open"),
            AlertState::Acknowledged => write!(f, "acknowledged"),
            AlertState::Resolved => write!(f, "resolved"),
        }
    }
}

/// Administrative region (LGA) reference data.
///
/// Owned by the administrative-data collaborator; the engine only reads
/// it (vulnerability inputs and region existence checks).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Region {
    /// Stable unique identifier
    pub id: String,
    /// Short administrative code (unique, e.g. "CR-CAL")
    pub code: String,
    /// Region display name
    pub name: String,
    /// Resident population
    pub population: Option<i64>,
    /// Area in square kilometres
    pub area_sq_km: Option<f64>,
    /// Share of population with safe water access (0-100)
    pub water_coverage_pct: Option<f64>,
    /// Share of population with sanitation access (0-100)
    pub sanitation_coverage_pct: Option<f64>,
    /// Number of health facilities
    pub health_facilities_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One environmental remote-sensing observation for a region on a date.
///
/// At most one row exists per (region, date); later writes for the same
/// key overwrite (correction/backfill support).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnvironmentalObservation {
    pub region_id: String,
    pub observation_date: NaiveDate,
    /// Daily precipitation in mm
    pub rainfall_mm: Option<f64>,
    /// 7-day cumulative precipitation in mm
    pub rainfall_7day_mm: Option<f64>,
    /// 30-day cumulative precipitation in mm
    pub rainfall_30day_mm: Option<f64>,
    /// Normalized Difference Water Index (-1..1)
    pub ndwi: Option<f64>,
    /// Normalized Difference Vegetation Index (-1..1)
    pub ndvi: Option<f64>,
    /// Percentage of region area observed flooded (0-100)
    pub flood_extent_pct: Option<f64>,
    /// Flooding directly observed (saturates the flood sub-score)
    pub flood_observed: bool,
    /// Land surface temperature in °C
    pub land_surface_temp: Option<f64>,
    /// Upstream data source tag (e.g. "GEE", "NASA_GPM")
    pub data_source: Option<String>,
}

/// One epidemiological case report for a region on a date.
///
/// Same (region, date) key and overwrite semantics as
/// [`EnvironmentalObservation`].
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CaseReport {
    pub region_id: String,
    pub report_date: NaiveDate,
    pub new_cases: i64,
    pub deaths: i64,
    pub suspected_cases: i64,
    pub confirmed_cases: i64,
}

/// Computed risk score for a region on a date.
///
/// Fully derived from observations plus region reference data; a
/// recompute run with the same (region, score_date) key overwrites the
/// prior row.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RiskScore {
    pub region_id: String,
    pub score_date: NaiveDate,
    pub flood_score: f64,
    pub rainfall_score: f64,
    pub case_score: f64,
    pub vulnerability_score: f64,
    pub composite_score: f64,
    pub level: RiskLevel,
    /// True when the flood sub-score is the neutral-fallback midpoint
    /// because no inputs existed in the window, rather than a measured
    /// value.
    pub flood_fallback: bool,
    pub rainfall_fallback: bool,
    pub case_fallback: bool,
    pub vulnerability_fallback: bool,
    /// Raw inputs snapshot for audit/debugging
    pub rainfall_7day_mm: Option<f64>,
    pub ndwi: Option<f64>,
    pub recent_cases: i64,
    pub recent_deaths: i64,
    pub algorithm_version: String,
    pub calculated_at: DateTime<Utc>,
}

/// An alert raised by the rule evaluator for a region.
///
/// Append-only audit trail: "resolved" is a state, not a deletion.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Alert {
    pub id: String,
    pub region_id: String,
    /// Rule that raised the alert
    pub rule_id: String,
    /// Alert type key; at most one unresolved alert exists per
    /// (region, alert_type)
    pub alert_type: String,
    pub severity: Severity,
    /// Risk level of the region at trigger time
    pub level: RiskLevel,
    pub title: String,
    pub message: String,
    /// JSON snapshot of the signal values that triggered the alert
    pub triggered_by: serde_json::Value,
    pub state: AlertState,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// "manual" for operator resolution, "auto" for engine-initiated
    pub resolution: Option<String>,
}

/// Outcome of one recompute run across all regions.
///
/// Partial-failure contract: one region's failure never aborts sibling
/// regions; callers always receive a structured summary rather than a
/// single pass/fail boolean.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunSummary {
    pub score_date: Option<NaiveDate>,
    pub regions_succeeded: u32,
    pub regions_failed: u32,
    pub errors: Vec<String>,
    /// Alerts opened during the run
    pub alerts_opened: u32,
    /// Alerts auto-resolved during the run
    pub alerts_resolved: u32,
}
