//! Composite risk scoring for flood-driven cholera surveillance.
//!
//! Pure computation over observation windows: no IO, no clocks. The same
//! inputs and configuration always produce the same [`RiskScore`], which
//! makes recompute runs idempotent by construction.

pub mod classify;
pub mod config;
pub mod score;

#[cfg(test)]
mod tests;

pub use classify::classify;
pub use config::{LevelThresholds, ReferenceRanges, RiskConfig, ScoreWeights, Windows};
pub use score::{ScoreCalculator, ScoreInputs, ALGORITHM_VERSION};
