//! Server crate: HTTP surface, recompute orchestration, rule loading and
//! seeding for the composite risk engine.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod region_seed;
pub mod rule_builder;
pub mod rule_seed;
pub mod scheduler;
pub mod state;
