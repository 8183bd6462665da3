//! Persistence layer for the composite risk scoring engine.
//!
//! A single [`store::SurveillanceStore`] fronts all tables (regions,
//! observations, case reports, risk scores, alert rules, alerts) over
//! SeaORM. Write paths validate referenced regions and metric ranges and
//! return typed [`error::StorageError`] values so the API layer can map
//! failures to precise HTTP statuses.

pub mod entities;
pub mod error;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{Result, StorageError};
pub use store::{AlertFilter, AlertRuleRow, AlertSummary, SurveillanceStore};
