use crate::config::ServerConfig;
use crate::orchestrator::RecomputeOrchestrator;
use chrono::{DateTime, Utc};
use floodwatch_alert::AlertEngine;
use floodwatch_risk::ScoreCalculator;
use floodwatch_storage::SurveillanceStore;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SurveillanceStore>,
    pub calculator: Arc<ScoreCalculator>,
    pub alert_engine: Arc<Mutex<AlertEngine>>,
    pub orchestrator: Arc<RecomputeOrchestrator>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}
