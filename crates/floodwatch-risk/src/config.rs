use floodwatch_common::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Sub-score weights for the composite. Must sum to 1.0 within 1e-6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_w_flood")]
    pub flood: f64,
    #[serde(default = "default_w_rainfall")]
    pub rainfall: f64,
    #[serde(default = "default_w_case")]
    pub case: f64,
    #[serde(default = "default_w_vulnerability")]
    pub vulnerability: f64,
}

fn default_w_flood() -> f64 {
    0.4
}

fn default_w_rainfall() -> f64 {
    0.2
}

fn default_w_case() -> f64 {
    0.3
}

fn default_w_vulnerability() -> f64 {
    0.1
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            flood: default_w_flood(),
            rainfall: default_w_rainfall(),
            case: default_w_case(),
            vulnerability: default_w_vulnerability(),
        }
    }
}

/// Classifier cut points. Deliberately carries no defaults: deployments
/// disagree on where medium and high begin, so the operator must choose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelThresholds {
    /// Composite at or above this value is at least medium
    pub medium_cutoff: f64,
    /// Composite at or above this value is high
    pub high_cutoff: f64,
}

/// Reference ranges used to normalize raw signals onto [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRanges {
    /// NDWI mapped linearly from [ndwi_low, ndwi_high] onto [0, 1]
    #[serde(default = "default_ndwi_low")]
    pub ndwi_low: f64,
    #[serde(default = "default_ndwi_high")]
    pub ndwi_high: f64,
    /// Flood extent percentage that saturates its normalized term
    #[serde(default = "default_flood_extent_ref_pct")]
    pub flood_extent_ref_pct: f64,
    /// 7-day rainfall (mm) that saturates the rainfall score
    #[serde(default = "default_rainfall_7day_ref_mm")]
    pub rainfall_7day_ref_mm: f64,
    /// 30-day rainfall (mm) reference for the blended term
    #[serde(default = "default_rainfall_30day_ref_mm")]
    pub rainfall_30day_ref_mm: f64,
    /// Windowed case count that saturates the case score
    #[serde(default = "default_case_ref_count")]
    pub case_ref_count: f64,
    /// Case fatality ratio above which the case score is amplified
    #[serde(default = "default_cfr_threshold")]
    pub cfr_threshold: f64,
    #[serde(default = "default_cfr_multiplier")]
    pub cfr_multiplier: f64,
}

fn default_ndwi_low() -> f64 {
    -0.5
}

fn default_ndwi_high() -> f64 {
    0.8
}

fn default_flood_extent_ref_pct() -> f64 {
    30.0
}

fn default_rainfall_7day_ref_mm() -> f64 {
    200.0
}

fn default_rainfall_30day_ref_mm() -> f64 {
    500.0
}

fn default_case_ref_count() -> f64 {
    50.0
}

fn default_cfr_threshold() -> f64 {
    0.05
}

fn default_cfr_multiplier() -> f64 {
    1.3
}

impl Default for ReferenceRanges {
    fn default() -> Self {
        Self {
            ndwi_low: default_ndwi_low(),
            ndwi_high: default_ndwi_high(),
            flood_extent_ref_pct: default_flood_extent_ref_pct(),
            rainfall_7day_ref_mm: default_rainfall_7day_ref_mm(),
            rainfall_30day_ref_mm: default_rainfall_30day_ref_mm(),
            case_ref_count: default_case_ref_count(),
            cfr_threshold: default_cfr_threshold(),
            cfr_multiplier: default_cfr_multiplier(),
        }
    }
}

/// Lookback windows, in days, ending at the score date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Windows {
    #[serde(default = "default_env_window_days")]
    pub env_window_days: u32,
    #[serde(default = "default_case_window_days")]
    pub case_window_days: u32,
}

fn default_env_window_days() -> u32 {
    7
}

fn default_case_window_days() -> u32 {
    30
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            env_window_days: default_env_window_days(),
            case_window_days: default_case_window_days(),
        }
    }
}

/// Full scoring configuration. Everything except the cut points carries
/// defaults taken from the operational calibration of the scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    pub thresholds: LevelThresholds,
    #[serde(default)]
    pub reference: ReferenceRanges,
    #[serde(default)]
    pub windows: Windows,
}

impl RiskConfig {
    /// Validates weights and cut points. Called once at startup; a bad
    /// scoring config is fatal before any region is scored.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        for (name, value) in [
            ("flood", w.flood),
            ("rainfall", w.rainfall),
            ("case", w.case),
            ("vulnerability", w.vulnerability),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig {
                    reason: format!("weight '{name}' must be a non-negative number: {value}"),
                });
            }
        }
        let sum = w.flood + w.rainfall + w.case + w.vulnerability;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidConfig {
                reason: format!("weights must sum to 1.0, got {sum}"),
            });
        }

        let t = &self.thresholds;
        if !(t.medium_cutoff > 0.0 && t.medium_cutoff < t.high_cutoff && t.high_cutoff < 1.0) {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "cut points must satisfy 0 < medium < high < 1, got medium={} high={}",
                    t.medium_cutoff, t.high_cutoff
                ),
            });
        }

        let r = &self.reference;
        if r.ndwi_low >= r.ndwi_high {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "ndwi_low must be below ndwi_high, got {} >= {}",
                    r.ndwi_low, r.ndwi_high
                ),
            });
        }
        for (name, value) in [
            ("flood_extent_ref_pct", r.flood_extent_ref_pct),
            ("rainfall_7day_ref_mm", r.rainfall_7day_ref_mm),
            ("rainfall_30day_ref_mm", r.rainfall_30day_ref_mm),
            ("case_ref_count", r.case_ref_count),
        ] {
            if !(value > 0.0) {
                return Err(EngineError::InvalidConfig {
                    reason: format!("reference '{name}' must be positive: {value}"),
                });
            }
        }

        if self.windows.env_window_days == 0 || self.windows.case_window_days == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "lookback windows must be at least 1 day".to_string(),
            });
        }

        Ok(())
    }
}
