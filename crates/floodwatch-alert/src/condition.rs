use floodwatch_common::types::RiskLevel;
use serde::{Deserialize, Serialize};

use crate::RegionSnapshot;

/// Raw signals a threshold condition may compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalMetric {
    #[serde(rename = "rainfall_mm")]
    RainfallMm,
    #[serde(rename = "rainfall_7day_mm")]
    Rainfall7DayMm,
    #[serde(rename = "ndwi")]
    Ndwi,
    #[serde(rename = "flood_extent_pct")]
    FloodExtentPct,
    #[serde(rename = "new_cases")]
    NewCases,
    #[serde(rename = "deaths")]
    Deaths,
    #[serde(rename = "composite_score")]
    CompositeScore,
}

impl SignalMetric {
    /// Resolves the signal value from a snapshot. `None` means the
    /// signal was not observed in the window.
    pub fn resolve(self, snapshot: &RegionSnapshot) -> Option<f64> {
        match self {
            SignalMetric::RainfallMm => snapshot.rainfall_mm,
            SignalMetric::Rainfall7DayMm => snapshot.rainfall_7day_mm,
            SignalMetric::Ndwi => snapshot.ndwi,
            SignalMetric::FloodExtentPct => snapshot.flood_extent_pct,
            SignalMetric::NewCases => Some(snapshot.new_cases as f64),
            SignalMetric::Deaths => Some(snapshot.deaths as f64),
            SignalMetric::CompositeScore => Some(snapshot.composite_score),
        }
    }
}

impl std::fmt::Display for SignalMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SignalMetric::RainfallMm => "rainfall_mm",
            SignalMetric::Rainfall7DayMm => "rainfall_7day_mm",
            SignalMetric::Ndwi => "ndwi",
            SignalMetric::FloodExtentPct => "flood_extent_pct",
            SignalMetric::NewCases => "new_cases",
            SignalMetric::Deaths => "deaths",
            SignalMetric::CompositeScore => "composite_score",
        };
        write!(f, "{s}")
    }
}

/// Comparison operator for threshold conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn compare(self, actual: f64, value: f64) -> bool {
        match self {
            CompareOp::Gt => actual > value,
            CompareOp::Gte => actual >= value,
            CompareOp::Lt => actual < value,
            CompareOp::Lte => actual <= value,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        };
        write!(f, "{s}")
    }
}

/// One condition in a rule's conjunction, as stored in
/// `alert_rules.conditions_json`.
///
/// # Examples
///
/// ```
/// use floodwatch_alert::condition::Condition;
///
/// let json = r#"{"kind":"metric_threshold","metric":"rainfall_7day_mm","op":"gte","value":150.0}"#;
/// let cond: Condition = serde_json::from_str(json).unwrap();
/// assert!(matches!(cond, Condition::MetricThreshold { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    MetricThreshold {
        metric: SignalMetric,
        op: CompareOp,
        value: f64,
    },
    LevelEq {
        level: RiskLevel,
    },
    LevelAtLeast {
        level: RiskLevel,
    },
    /// Level at or above `level` for `days` consecutive score dates,
    /// the current date included.
    ConsecutiveLevel {
        level: RiskLevel,
        days: u32,
    },
    FloodObserved,
}

impl Condition {
    /// A signal that was never observed in the window cannot satisfy a
    /// threshold condition.
    pub fn is_met(&self, snapshot: &RegionSnapshot) -> bool {
        match self {
            Condition::MetricThreshold { metric, op, value } => metric
                .resolve(snapshot)
                .is_some_and(|actual| op.compare(actual, *value)),
            Condition::LevelEq { level } => snapshot.level == *level,
            Condition::LevelAtLeast { level } => snapshot.level >= *level,
            Condition::ConsecutiveLevel { level, days } => {
                let days = *days as usize;
                snapshot.level_history.len() >= days
                    && snapshot.level_history[..days].iter().all(|l| l >= level)
            }
            Condition::FloodObserved => snapshot.flood_observed,
        }
    }

    /// Human-readable form with actual values, used in alert messages.
    pub fn describe(&self, snapshot: &RegionSnapshot) -> String {
        match self {
            Condition::MetricThreshold { metric, op, value } => match metric.resolve(snapshot) {
                Some(actual) => format!("{metric} {op} {value} (actual {actual:.2})"),
                None => format!("{metric} {op} {value} (no data)"),
            },
            Condition::LevelEq { level } => {
                format!("risk level = {level} (actual {})", snapshot.level)
            }
            Condition::LevelAtLeast { level } => {
                format!("risk level >= {level} (actual {})", snapshot.level)
            }
            Condition::ConsecutiveLevel { level, days } => {
                format!("risk level >= {level} for {days} consecutive days")
            }
            Condition::FloodObserved => "flooding directly observed".to_string(),
        }
    }
}
