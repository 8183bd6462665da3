use floodwatch_common::types::RiskLevel;

use crate::config::LevelThresholds;

/// Maps a composite score onto a risk level. Boundaries belong to the
/// tier above: exactly `medium_cutoff` is medium, exactly `high_cutoff`
/// is high. No hysteresis; each score date classifies independently.
pub fn classify(composite: f64, thresholds: &LevelThresholds) -> RiskLevel {
    if composite >= thresholds.high_cutoff {
        RiskLevel::High
    } else if composite >= thresholds.medium_cutoff {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
