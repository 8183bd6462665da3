use chrono::Utc;

use floodwatch_common::error::Result;
use floodwatch_common::types::{CaseReport, EnvironmentalObservation, Region, RiskScore};

use crate::classify::classify;
use crate::config::RiskConfig;

/// Recorded on every score row so historical scores stay interpretable
/// when the formula changes.
pub const ALGORITHM_VERSION: &str = "1.0.0";

/// Sub-score value when a component has no inputs at all in its window.
const NEUTRAL_MIDPOINT: f64 = 0.5;

/// Windowed inputs for one region on one score date.
///
/// Both slices are expected ascending by date, covering the configured
/// lookback windows ending at `score_date`. Empty slices are valid and
/// trigger the neutral fallback for the affected components.
pub struct ScoreInputs<'a> {
    pub region: &'a Region,
    pub score_date: chrono::NaiveDate,
    pub observations: &'a [EnvironmentalObservation],
    pub case_reports: &'a [CaseReport],
}

struct Component {
    value: f64,
    fallback: bool,
}

impl Component {
    fn measured(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            fallback: false,
        }
    }

    fn neutral() -> Self {
        Self {
            value: NEUTRAL_MIDPOINT,
            fallback: true,
        }
    }
}

/// Computes sub-scores, the weighted composite, and the risk level from
/// windowed observations. Construction validates the configuration, so a
/// held calculator is always internally consistent.
pub struct ScoreCalculator {
    config: RiskConfig,
}

fn lin(x: f64, lo: f64, hi: f64) -> f64 {
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Most recent non-missing value of one signal across the window.
fn latest_signal<T, F>(observations: &[EnvironmentalObservation], f: F) -> Option<T>
where
    F: Fn(&EnvironmentalObservation) -> Option<T>,
{
    observations.iter().rev().find_map(f)
}

impl ScoreCalculator {
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn compute(&self, inputs: &ScoreInputs<'_>) -> RiskScore {
        let w = &self.config.weights;

        let ndwi = latest_signal(inputs.observations, |o| o.ndwi);
        let rainfall_7day = self.effective_rainfall_7day(inputs.observations);
        let recent_cases: i64 = inputs.case_reports.iter().map(|r| r.new_cases).sum();
        let recent_deaths: i64 = inputs.case_reports.iter().map(|r| r.deaths).sum();

        let flood = self.flood_component(inputs.observations, ndwi);
        let rainfall = self.rainfall_component(inputs.observations, rainfall_7day);
        let case = self.case_component(inputs.case_reports, recent_cases, recent_deaths);
        let vulnerability = self.vulnerability_component(inputs.region);

        let composite = (w.flood * flood.value
            + w.rainfall * rainfall.value
            + w.case * case.value
            + w.vulnerability * vulnerability.value)
            .clamp(0.0, 1.0);
        let level = classify(composite, &self.config.thresholds);

        RiskScore {
            region_id: inputs.region.id.clone(),
            score_date: inputs.score_date,
            flood_score: flood.value,
            rainfall_score: rainfall.value,
            case_score: case.value,
            vulnerability_score: vulnerability.value,
            composite_score: composite,
            level,
            flood_fallback: flood.fallback,
            rainfall_fallback: rainfall.fallback,
            case_fallback: case.fallback,
            vulnerability_fallback: vulnerability.fallback,
            rainfall_7day_mm: rainfall_7day,
            ndwi,
            recent_cases,
            recent_deaths,
            algorithm_version: ALGORITHM_VERSION.to_string(),
            calculated_at: Utc::now(),
        }
    }

    /// Water-presence sub-score. Directly observed flooding saturates
    /// the score regardless of what the indices say.
    fn flood_component(
        &self,
        observations: &[EnvironmentalObservation],
        ndwi: Option<f64>,
    ) -> Component {
        if observations.iter().any(|o| o.flood_observed) {
            return Component::measured(1.0);
        }
        let r = &self.config.reference;
        let extent = latest_signal(observations, |o| o.flood_extent_pct);
        match (ndwi, extent) {
            (Some(n), Some(e)) => Component::measured(
                0.6 * lin(n, r.ndwi_low, r.ndwi_high) + 0.4 * lin(e, 0.0, r.flood_extent_ref_pct),
            ),
            // With one index missing, the other carries the full weight
            (Some(n), None) => Component::measured(lin(n, r.ndwi_low, r.ndwi_high)),
            (None, Some(e)) => Component::measured(lin(e, 0.0, r.flood_extent_ref_pct)),
            (None, None) => Component::neutral(),
        }
    }

    /// 7-day cumulative rainfall, preferring the upstream-computed field
    /// and falling back to summing daily readings in the window.
    fn effective_rainfall_7day(&self, observations: &[EnvironmentalObservation]) -> Option<f64> {
        if let Some(v) = latest_signal(observations, |o| o.rainfall_7day_mm) {
            return Some(v);
        }
        let dailies: Vec<f64> = observations.iter().filter_map(|o| o.rainfall_mm).collect();
        if dailies.is_empty() {
            None
        } else {
            Some(dailies.iter().sum())
        }
    }

    fn rainfall_component(
        &self,
        observations: &[EnvironmentalObservation],
        rainfall_7day: Option<f64>,
    ) -> Component {
        let r = &self.config.reference;
        let rainfall_30day = latest_signal(observations, |o| o.rainfall_30day_mm);
        match (rainfall_7day, rainfall_30day) {
            (Some(week), Some(month)) => Component::measured(
                0.7 * lin(week, 0.0, r.rainfall_7day_ref_mm)
                    + 0.3 * lin(month, 0.0, r.rainfall_30day_ref_mm),
            ),
            (Some(week), None) => Component::measured(lin(week, 0.0, r.rainfall_7day_ref_mm)),
            (None, Some(month)) => Component::measured(lin(month, 0.0, r.rainfall_30day_ref_mm)),
            (None, None) => Component::neutral(),
        }
    }

    /// Case burden over the case window. A high case fatality ratio
    /// amplifies the score: deaths signal late detection or a strained
    /// health system.
    fn case_component(&self, reports: &[CaseReport], cases: i64, deaths: i64) -> Component {
        if reports.is_empty() {
            return Component::neutral();
        }
        let r = &self.config.reference;
        let mut score = lin(cases as f64, 0.0, r.case_ref_count);
        if cases > 0 && deaths > 0 {
            let cfr = deaths as f64 / cases as f64;
            if cfr > r.cfr_threshold {
                score *= r.cfr_multiplier;
            }
        }
        Component::measured(score)
    }

    /// Structural susceptibility from water and sanitation coverage.
    /// Lower coverage means higher vulnerability.
    fn vulnerability_component(&self, region: &Region) -> Component {
        let deprivations: Vec<f64> = [region.water_coverage_pct, region.sanitation_coverage_pct]
            .into_iter()
            .flatten()
            .map(|cov| 1.0 - (cov / 100.0).clamp(0.0, 1.0))
            .collect();
        if deprivations.is_empty() {
            Component::neutral()
        } else {
            Component::measured(deprivations.iter().sum::<f64>() / deprivations.len() as f64)
        }
    }
}
