pub mod alert;
pub mod alert_rule;
pub mod case_report;
pub mod environmental_observation;
pub mod region;
pub mod risk_score;
